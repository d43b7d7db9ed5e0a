//! GeoTIFF reading and writing on top of the `tiff` crate
//!
//! Georeferencing is taken from ModelPixelScaleTag + ModelTiepointTag and
//! the no-data value from GDAL_NODATA. Rasters are always read as `f64`.

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: u16 = 33550;
const MODEL_TIEPOINT: u16 = 33922;
const GEO_KEY_DIRECTORY: u16 = 34735;
const GDAL_NODATA: u16 = 42113;

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<P: AsRef<Path>>(path: P) -> Result<Raster<f64>> {
    let file = File::open(path.as_ref())?;
    decode_geotiff(BufReader::new(file))
}

/// Read a GeoTIFF from an in-memory buffer
pub fn read_geotiff_from_buffer(data: &[u8]) -> Result<Raster<f64>> {
    decode_geotiff(Cursor::new(data))
}

fn tiff_err(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Raster<f64>> {
    let mut decoder = Decoder::new(reader).map_err(tiff_err("TIFF decode error"))?;

    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_err("Cannot read dimensions"))?;
    let rows = height as usize;
    let cols = width as usize;

    let result = decoder
        .read_image()
        .map_err(tiff_err("Cannot read image data"))?;

    let data: Vec<f64> = match result {
        DecodingResult::F32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::F64(buf) => buf,
        DecodingResult::U8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f64::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(f64::from).collect(),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-sample images decode interleaved; keep the first band only
    let samples = if rows * cols == 0 { 0 } else { data.len() / (rows * cols) };
    let data = match samples {
        1 => data,
        n if n > 1 => data.into_iter().step_by(n).collect(),
        _ => {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            })
        }
    };

    let mut raster = Raster::from_vec(data, rows, cols)?;

    if let Some(transform) = read_geotransform(&mut decoder) {
        raster.set_transform(transform);
    }
    raster.set_nodata(read_nodata(&mut decoder));

    Ok(raster)
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_PIXEL_SCALE)).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(Tag::Unknown(MODEL_TIEPOINT)).ok()?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }

    // tiepoint: [I, J, K, X, Y, Z], scale: [ScaleX, ScaleY, ScaleZ]
    let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
    let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
    Some(GeoTransform::new(origin_x, origin_y, scale[0], -scale[1]))
}

fn read_nodata<R: Read + Seek>(decoder: &mut Decoder<R>) -> Option<f64> {
    let text = decoder
        .get_tag_ascii_string(Tag::Unknown(GDAL_NODATA))
        .ok()?;
    text.trim_matches(char::from(0)).trim().parse().ok()
}

/// Write a raster as a single-band 32-bit float GeoTIFF
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::create(path.as_ref())?;
    encode_geotiff(raster, BufWriter::new(file))
}

/// Write a raster to an in-memory GeoTIFF buffer
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: Write + Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_err("TIFF encoder error"))?;

    let (rows, cols) = raster.shape();
    let nodata = raster.nodata().and_then(|nd| nd.to_f64());

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| match (raster.is_nodata(v), nodata) {
            (true, Some(nd)) => nd as f32,
            (true, None) => f32::NAN,
            (false, _) => v.to_f64().map_or(f32::NAN, |f| f as f32),
        })
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_err("Cannot create TIFF image"))?;

    let gt = raster.transform();

    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_PIXEL_SCALE), &scale[..])
        .map_err(tiff_err("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(Tag::Unknown(MODEL_TIEPOINT), &tiepoint[..])
        .map_err(tiff_err("Cannot write tiepoint tag"))?;

    // Version 1.1.0 with two keys: projected model, pixel-is-area
    let geokeys: [u16; 12] = [1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1];
    image
        .encoder()
        .write_tag(Tag::Unknown(GEO_KEY_DIRECTORY), &geokeys[..])
        .map_err(tiff_err("Cannot write geokey tag"))?;

    if let Some(nd) = nodata {
        let text = nd.to_string();
        image
            .encoder()
            .write_tag(Tag::Unknown(GDAL_NODATA), text.as_str())
            .map_err(tiff_err("Cannot write nodata tag"))?;
    }

    image
        .write_data(&data)
        .map_err(tiff_err("Cannot write image data"))?;

    Ok(())
}
