//! Minimal GeoPackage writer: one LINESTRING feature table.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection};

use crate::error::{Error, Result};
use crate::geo::Crs;
use crate::geometry::{GeometryCollection, LineGeometry};

/// Feature table holding the traced lines.
pub const TABLE: &str = "terraces";

const APPLICATION_ID: i32 = 0x4750_4B47; // "GPKG"
const USER_VERSION: i32 = 10200;
const UNDEFINED_SRS: i32 = -1;

const SCHEMA: &str = "
CREATE TABLE gpkg_spatial_ref_sys (
    srs_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL PRIMARY KEY,
    organization TEXT NOT NULL,
    organization_coordsys_id INTEGER NOT NULL,
    definition TEXT NOT NULL,
    description TEXT
);
CREATE TABLE gpkg_contents (
    table_name TEXT NOT NULL PRIMARY KEY,
    data_type TEXT NOT NULL,
    identifier TEXT UNIQUE,
    description TEXT DEFAULT '',
    last_change DATETIME NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
    min_x DOUBLE,
    min_y DOUBLE,
    max_x DOUBLE,
    max_y DOUBLE,
    srs_id INTEGER,
    CONSTRAINT fk_gc_r_srs_id FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE gpkg_geometry_columns (
    table_name TEXT NOT NULL,
    column_name TEXT NOT NULL,
    geometry_type_name TEXT NOT NULL,
    srs_id INTEGER NOT NULL,
    z TINYINT NOT NULL,
    m TINYINT NOT NULL,
    CONSTRAINT pk_geom_cols PRIMARY KEY (table_name, column_name),
    CONSTRAINT fk_gc_tn FOREIGN KEY (table_name) REFERENCES gpkg_contents(table_name),
    CONSTRAINT fk_gc_srs FOREIGN KEY (srs_id) REFERENCES gpkg_spatial_ref_sys(srs_id)
);
CREATE TABLE terraces (
    fid INTEGER PRIMARY KEY AUTOINCREMENT,
    geom LINESTRING,
    length REAL
);
INSERT INTO gpkg_spatial_ref_sys VALUES
    ('Undefined cartesian SRS', -1, 'NONE', -1, 'undefined', 'undefined cartesian coordinate reference system'),
    ('Undefined geographic SRS', 0, 'NONE', 0, 'undefined', 'undefined geographic coordinate reference system'),
    ('WGS 84 geodetic', 4326, 'EPSG', 4326,
     'GEOGCS[\"WGS 84\",DATUM[\"WGS_1984\",SPHEROID[\"WGS 84\",6378137,298.257223563]],PRIMEM[\"Greenwich\",0],UNIT[\"degree\",0.0174532925199433]]',
     'longitude/latitude coordinates in decimal degrees on the WGS 84 spheroid');
";

/// Encodes `line` as a GeoPackage binary geometry: header with envelope, then little endian WKB.
pub fn encode_geometry(line: &LineGeometry, srs_id: i32) -> Vec<u8> {
    let points = line.points();
    let (min_x, min_y, max_x, max_y) = line.envelope();
    let mut blob = Vec::with_capacity(8 + 32 + 9 + points.len() * 16);
    blob.extend_from_slice(b"GP");
    blob.push(0); // version 1
    blob.push(0b0000_0011); // little endian, xy envelope
    blob.extend_from_slice(&srs_id.to_le_bytes());
    for v in [min_x, max_x, min_y, max_y] {
        blob.extend_from_slice(&v.to_le_bytes());
    }
    blob.push(1);
    blob.extend_from_slice(&2u32.to_le_bytes());
    blob.extend_from_slice(&(points.len() as u32).to_le_bytes());
    for p in points {
        blob.extend_from_slice(&p.x.to_le_bytes());
        blob.extend_from_slice(&p.y.to_le_bytes());
    }
    blob
}

fn register_crs(conn: &Connection, crs: Crs) -> rusqlite::Result<i32> {
    let srs_id = i32::from(crs.epsg());
    let definition = crs.wkt().unwrap_or("undefined");
    conn.execute(
        "INSERT OR IGNORE INTO gpkg_spatial_ref_sys
            (srs_name, srs_id, organization, organization_coordsys_id, definition)
         VALUES (?1, ?2, 'EPSG', ?2, ?3)",
        params![crs.to_string(), srs_id, definition],
    )?;
    Ok(srs_id)
}

/// Writes `collection` to a new GeoPackage at `path`, replacing any existing file.
pub fn write(collection: &GeometryCollection, path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).map_err(|err| Error::write(path, err))?;
    }
    write_tables(collection, path).map_err(|err| Error::write(path, err))
}

fn write_tables(collection: &GeometryCollection, path: &Path) -> rusqlite::Result<()> {
    let mut conn = Connection::open(path)?;
    conn.pragma_update(None, "application_id", APPLICATION_ID)?;
    conn.pragma_update(None, "user_version", USER_VERSION)?;
    conn.execute_batch(SCHEMA)?;

    let tx = conn.transaction()?;
    let srs_id = match collection.crs() {
        Some(crs) => register_crs(&tx, crs)?,
        None => UNDEFINED_SRS,
    };
    let (min_x, min_y, max_x, max_y) = match collection.envelope() {
        Some((min_x, min_y, max_x, max_y)) => (Some(min_x), Some(min_y), Some(max_x), Some(max_y)),
        None => (None, None, None, None),
    };
    tx.execute(
        "INSERT INTO gpkg_contents (table_name, data_type, identifier, min_x, min_y, max_x, max_y, srs_id)
         VALUES (?1, 'features', ?1, ?2, ?3, ?4, ?5, ?6)",
        params![TABLE, min_x, min_y, max_x, max_y, srs_id],
    )?;
    tx.execute(
        "INSERT INTO gpkg_geometry_columns VALUES (?1, 'geom', 'LINESTRING', ?2, 0, 0)",
        params![TABLE, srs_id],
    )?;
    {
        let mut insert = tx.prepare("INSERT INTO terraces (geom, length) VALUES (?1, ?2)")?;
        for line in collection.lines() {
            insert.execute(params![encode_geometry(line, srs_id), line.length()])?;
        }
    }
    tx.commit()
}
