//! Reading source rasters and persisting masks, with GeoTIFF georeference support.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::{colortype, compression::Lzw, TiffEncoder};
use tiff::tags::Tag;
use tracing::info;

use crate::error::{Error, Result};
use crate::geo::{AffineTransform, Crs, GeoContext};
use crate::mask::BinaryMask;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const MODEL_TRANSFORMATION: u16 = 34264;
const GEO_KEY_DIRECTORY: u16 = 34735;

const GT_MODEL_TYPE: u32 = 1024;
const GT_RASTER_TYPE: u32 = 1025;
const GEOGRAPHIC_TYPE: u32 = 2048;
const PROJECTED_CS_TYPE: u32 = 3072;

const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;
const RASTER_PIXEL_IS_POINT: u32 = 2;
const USER_DEFINED: u32 = 32767;

/// A decoded source raster.
#[derive(Clone, Debug)]
pub struct RasterImage {
    /// Pixels in RGB channel order.
    pub pixels: RgbImage,
    /// Georeference of the file, if it carried a complete one.
    pub geo: Option<GeoContext>,
}

/// Reads source rasters and writes masks.
pub trait RasterCodec {
    /// Decodes the raster at `path` together with its georeference.
    fn read(&self, path: &Path) -> Result<RasterImage>;

    /// Writes `mask` next to `stem`, choosing the extension, and returns the written path.
    fn write_mask(&self, mask: &BinaryMask, geo: Option<&GeoContext>, stem: &Path) -> Result<PathBuf>;
}

/// GeoTIFF for `.tif`/`.tiff` files, any format the `image` crate knows otherwise.
///
/// Masks with a georeference are written as LZW compressed GeoTIFF, masks without one as PNG.
#[derive(Copy, Clone, Debug, Default)]
pub struct GeoTiffCodec;

impl RasterCodec for GeoTiffCodec {
    fn read(&self, path: &Path) -> Result<RasterImage> {
        let raster = if is_tiff(path) {
            read_geotiff(path)?
        } else {
            let pixels = image::open(path)
                .map_err(|err| Error::read(path, err))?
                .to_rgb8();
            RasterImage { pixels, geo: None }
        };
        info!(
            path = %path.display(),
            width = raster.pixels.width(),
            height = raster.pixels.height(),
            georeferenced = raster.geo.is_some(),
            "read raster"
        );
        Ok(raster)
    }

    fn write_mask(&self, mask: &BinaryMask, geo: Option<&GeoContext>, stem: &Path) -> Result<PathBuf> {
        let path = match geo {
            Some(geo) => {
                let path = stem.with_extension("tif");
                write_geotiff(mask, geo, &path)?;
                path
            }
            None => {
                let path = stem.with_extension("png");
                mask.as_image()
                    .save(&path)
                    .map_err(|err| Error::write(&path, err))?;
                path
            }
        };
        info!(path = %path.display(), "wrote mask");
        Ok(path)
    }
}

fn is_tiff(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map_or(false, |ext| ext.eq_ignore_ascii_case("tif") || ext.eq_ignore_ascii_case("tiff"))
}

fn read_geotiff(path: &Path) -> Result<RasterImage> {
    let file = File::open(path).map_err(|err| Error::read(path, err))?;
    let mut decoder = Decoder::new(BufReader::new(file)).map_err(|err| Error::read(path, err))?;
    let (width, height) = decoder.dimensions().map_err(|err| Error::read(path, err))?;
    let geo = read_geo_context(&mut decoder).map_err(|err| Error::read(path, err))?;
    let samples = match decoder.read_image().map_err(|err| Error::read(path, err))? {
        DecodingResult::U8(samples) => samples,
        DecodingResult::U16(samples) => samples.into_iter().map(|s| (s >> 8) as u8).collect(),
        DecodingResult::F32(samples) => samples.into_iter().map(|s| s.clamp(0.0, 255.0) as u8).collect(),
        DecodingResult::F64(samples) => samples.into_iter().map(|s| s.clamp(0.0, 255.0) as u8).collect(),
        _ => return Err(Error::read(path, "unsupported sample format")),
    };
    let pixels = to_rgb(width, height, &samples).ok_or_else(|| {
        Error::read(path, format!("{} samples do not fill a {}x{} raster", samples.len(), width, height))
    })?;
    Ok(RasterImage { pixels, geo })
}

/// Interleaved band samples to RGB: three bands map to R, G, B, any other count replicates the
/// first band.
fn to_rgb(width: u32, height: u32, samples: &[u8]) -> Option<RgbImage> {
    let count = width as usize * height as usize;
    if count == 0 || samples.len() < count {
        return None;
    }
    let bands = samples.len() / count;
    Some(RgbImage::from_fn(width, height, |x, y| {
        let i = (y as usize * width as usize + x as usize) * bands;
        if bands == 3 {
            Rgb([samples[i], samples[i + 1], samples[i + 2]])
        } else {
            Rgb([samples[i]; 3])
        }
    }))
}

fn find_f64s<R>(decoder: &mut Decoder<R>, tag: u16) -> tiff::TiffResult<Option<Vec<f64>>>
where
    R: std::io::Read + std::io::Seek,
{
    decoder
        .find_tag(Tag::from_u16_exhaustive(tag))?
        .map(|value| value.into_f64_vec())
        .transpose()
}

fn read_geo_context<R>(decoder: &mut Decoder<R>) -> tiff::TiffResult<Option<GeoContext>>
where
    R: std::io::Read + std::io::Seek,
{
    let keys = match decoder.find_tag(Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY))? {
        Some(value) => GeoKeys::parse(&value.into_u32_vec()?),
        None => GeoKeys::default(),
    };
    let transform = match find_f64s(decoder, MODEL_TRANSFORMATION)? {
        Some(m) if m.len() >= 8 => Some(AffineTransform::new(m[0], m[1], m[3], m[4], m[5], m[7])),
        _ => {
            let scale = find_f64s(decoder, MODEL_PIXEL_SCALE)?;
            let tiepoint = find_f64s(decoder, MODEL_TIEPOINT)?;
            match (scale, tiepoint) {
                (Some(s), Some(t)) if s.len() >= 2 && t.len() >= 6 => Some(AffineTransform::new(
                    s[0],
                    0.0,
                    t[3] - t[0] * s[0],
                    0.0,
                    -s[1],
                    t[4] + t[1] * s[1],
                )),
                _ => None,
            }
        }
    };
    let transform = transform.map(|t| {
        if keys.raster_type == Some(RASTER_PIXEL_IS_POINT) {
            let (c, f) = t.apply(-0.5, -0.5);
            AffineTransform { c, f, ..t }
        } else {
            t
        }
    });
    Ok(GeoContext::from_parts(transform, keys.crs()))
}

/// The GeoKeys this crate understands, all stored inline in the key directory.
#[derive(Debug, Default, PartialEq)]
struct GeoKeys {
    raster_type: Option<u32>,
    projected: Option<u32>,
    geographic: Option<u32>,
}

impl GeoKeys {
    fn parse(directory: &[u32]) -> GeoKeys {
        let mut keys = GeoKeys::default();
        for entry in directory.chunks_exact(4).skip(1) {
            let (id, location, value) = (entry[0], entry[1], entry[3]);
            if location != 0 {
                continue;
            }
            match id {
                GT_RASTER_TYPE => keys.raster_type = Some(value),
                PROJECTED_CS_TYPE => keys.projected = Some(value),
                GEOGRAPHIC_TYPE => keys.geographic = Some(value),
                _ => {}
            }
        }
        keys
    }

    fn crs(&self) -> Option<Crs> {
        [self.projected, self.geographic]
            .into_iter()
            .flatten()
            .find(|&code| code != 0 && code != USER_DEFINED)
            .and_then(|code| u16::try_from(code).ok())
            .map(Crs::from_epsg)
    }
}

fn key_directory(crs: Crs) -> Vec<u16> {
    let (model_type, crs_key) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE)
    } else {
        (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE)
    };
    vec![
        1, 1, 0, 3,
        GT_MODEL_TYPE as u16, 0, 1, model_type,
        GT_RASTER_TYPE as u16, 0, 1, RASTER_PIXEL_IS_AREA,
        crs_key as u16, 0, 1, crs.epsg(),
    ]
}

fn write_geotiff(mask: &BinaryMask, geo: &GeoContext, path: &Path) -> Result<()> {
    let encode = || -> tiff::TiffResult<()> {
        let file = File::create(path)?;
        let mut encoder = TiffEncoder::new(BufWriter::new(file))?;
        let (width, height) = mask.dimensions();
        let mut image =
            encoder.new_image_with_compression::<colortype::Gray8, _>(width, height, Lzw::default())?;
        let t = geo.transform;
        if t.is_rotated() {
            let matrix = [
                t.a, t.b, 0.0, t.c,
                t.d, t.e, 0.0, t.f,
                0.0, 0.0, 0.0, 0.0,
                0.0, 0.0, 0.0, 1.0,
            ];
            image.encoder().write_tag(Tag::from_u16_exhaustive(MODEL_TRANSFORMATION), &matrix[..])?;
        } else {
            image.encoder().write_tag(Tag::from_u16_exhaustive(MODEL_PIXEL_SCALE), &[t.a, -t.e, 0.0][..])?;
            image.encoder().write_tag(
                Tag::from_u16_exhaustive(MODEL_TIEPOINT),
                &[0.0, 0.0, 0.0, t.c, t.f, 0.0][..],
            )?;
        }
        image.encoder().write_tag(
            Tag::from_u16_exhaustive(GEO_KEY_DIRECTORY),
            &key_directory(geo.crs)[..],
        )?;
        image.write_data(mask.as_image().as_raw())
    };
    encode().map_err(|err| Error::write(path, err))
}
