//! GeoTIFF reading and writing with the `tiff` crate
//!
//! Only the georeferencing the engine needs is handled: pixel scale and
//! tiepoint for the transform, the EPSG code from the GeoKey directory, and
//! the GDAL no-data tag.

use crate::crs::CRS;
use crate::error::{Error, Result};
use crate::raster::{GeoTransform, Raster, RasterElement};
use std::fs::File;
use std::io::{BufWriter, Cursor};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::Gray32Float;
use tiff::encoder::TiffEncoder;
use tiff::tags::Tag;

const MODEL_PIXEL_SCALE: Tag = Tag::ModelPixelScaleTag;
const MODEL_TIEPOINT: Tag = Tag::ModelTiepointTag;
const GEO_KEY_DIRECTORY: Tag = Tag::GeoKeyDirectoryTag;
const GDAL_NODATA: Tag = Tag::GdalNodata;

const GT_MODEL_TYPE: u16 = 1024;
const GT_RASTER_TYPE: u16 = 1025;
const GEOGRAPHIC_TYPE: u16 = 2048;
const PROJECTED_CS_TYPE: u16 = 3072;

/// Read the first band of a GeoTIFF file
pub fn read_geotiff<T, P>(path: P) -> Result<Raster<T>>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref())?;
    decode_geotiff(file)
}

/// Read a GeoTIFF held in memory
pub fn read_geotiff_from_buffer<T: RasterElement>(data: &[u8]) -> Result<Raster<T>> {
    decode_geotiff(Cursor::new(data))
}

fn tiff_error(context: &str) -> impl Fn(tiff::TiffError) -> Error + '_ {
    move |e| Error::Other(format!("{}: {}", context, e))
}

fn cast_all<S, T>(buf: Vec<S>) -> Vec<T>
where
    S: num_traits::NumCast + Copy,
    T: RasterElement,
{
    buf.into_iter()
        .map(|v| num_traits::cast(v).unwrap_or_else(T::default_nodata))
        .collect()
}

fn decode_geotiff<T, R>(reader: R) -> Result<Raster<T>>
where
    T: RasterElement,
    R: std::io::Read + std::io::Seek,
{
    let mut decoder = Decoder::new(reader).map_err(tiff_error("TIFF decode error"))?;
    let (width, height) = decoder
        .dimensions()
        .map_err(tiff_error("Cannot read dimensions"))?;
    let (rows, cols) = (height as usize, width as usize);

    let data: Vec<T> = match decoder
        .read_image()
        .map_err(tiff_error("Cannot read image data"))?
    {
        DecodingResult::U8(buf) => cast_all(buf),
        DecodingResult::U16(buf) => cast_all(buf),
        DecodingResult::U32(buf) => cast_all(buf),
        DecodingResult::I8(buf) => cast_all(buf),
        DecodingResult::I16(buf) => cast_all(buf),
        DecodingResult::I32(buf) => cast_all(buf),
        DecodingResult::F32(buf) => cast_all(buf),
        DecodingResult::F64(buf) => cast_all(buf),
        _ => {
            return Err(Error::UnsupportedDataType(
                "Unsupported TIFF pixel format".to_string(),
            ))
        }
    };

    // Multi-band images decode interleaved; keep the first sample per cell.
    let data = match data.len() {
        n if n == rows * cols => data,
        n if rows * cols > 0 && n % (rows * cols) == 0 => {
            let bands = n / (rows * cols);
            data.into_iter().step_by(bands).collect()
        }
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
    raster.set_crs(read_epsg(&mut decoder).map(CRS::from_epsg));
    if let Ok(text) = decoder.get_tag_ascii_string(GDAL_NODATA) {
        raster.set_nodata(parse_nodata(&text));
    }
    Ok(raster)
}

fn read_geotransform<R: std::io::Read + std::io::Seek>(
    decoder: &mut Decoder<R>,
) -> Option<GeoTransform> {
    let scale = decoder.get_tag_f64_vec(MODEL_PIXEL_SCALE).ok()?;
    let tiepoint = decoder.get_tag_f64_vec(MODEL_TIEPOINT).ok()?;
    if scale.len() < 2 || tiepoint.len() < 6 {
        return None;
    }
    // tiepoint: [I, J, K, X, Y, Z]
    Some(GeoTransform::new(
        tiepoint[3] - tiepoint[0] * scale[0],
        tiepoint[4] + tiepoint[1] * scale[1],
        scale[0],
        -scale[1],
    ))
}

fn read_epsg<R: std::io::Read + std::io::Seek>(decoder: &mut Decoder<R>) -> Option<u32> {
    let keys = decoder.get_tag_u16_vec(GEO_KEY_DIRECTORY).ok()?;
    keys.get(4..)?
        .chunks_exact(4)
        .find(|key| (key[0] == GEOGRAPHIC_TYPE || key[0] == PROJECTED_CS_TYPE) && key[1] == 0)
        .map(|key| u32::from(key[3]))
}

fn parse_nodata<T: RasterElement>(text: &str) -> Option<T> {
    let value: f64 = text.trim_matches(char::from(0)).trim().parse().ok()?;
    num_traits::cast(value)
}

/// Write a raster to a GeoTIFF file as 32-bit float
pub fn write_geotiff<T, P>(raster: &Raster<T>, path: P) -> Result<()>
where
    T: RasterElement,
    P: AsRef<Path>,
{
    let file = BufWriter::new(File::create(path.as_ref())?);
    encode_geotiff(raster, file)
}

/// Encode a raster as an in-memory GeoTIFF
pub fn write_geotiff_to_buffer<T: RasterElement>(raster: &Raster<T>) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_geotiff(raster, Cursor::new(&mut buf))?;
    Ok(buf)
}

fn encode_geotiff<T, W>(raster: &Raster<T>, writer: W) -> Result<()>
where
    T: RasterElement,
    W: std::io::Write + std::io::Seek,
{
    let mut encoder = TiffEncoder::new(writer).map_err(tiff_error("TIFF encoder error"))?;
    let (rows, cols) = raster.shape();

    let data: Vec<f32> = raster
        .data()
        .iter()
        .map(|&v| num_traits::cast(v).unwrap_or(f32::NAN))
        .collect();

    let mut image = encoder
        .new_image::<Gray32Float>(cols as u32, rows as u32)
        .map_err(tiff_error("Cannot create TIFF image"))?;

    let gt = raster.transform();
    let scale = [gt.pixel_width, gt.pixel_height.abs(), 0.0];
    image
        .encoder()
        .write_tag(MODEL_PIXEL_SCALE, &scale[..])
        .map_err(tiff_error("Cannot write scale tag"))?;

    let tiepoint = [0.0, 0.0, 0.0, gt.origin_x, gt.origin_y, 0.0];
    image
        .encoder()
        .write_tag(MODEL_TIEPOINT, &tiepoint[..])
        .map_err(tiff_error("Cannot write tiepoint tag"))?;

    image
        .encoder()
        .write_tag(GEO_KEY_DIRECTORY, &geo_keys(raster.crs())[..])
        .map_err(tiff_error("Cannot write geokey tag"))?;

    if let Some(nodata) = raster.nodata().and_then(RasterElement::to_f64) {
        image
            .encoder()
            .write_tag(GDAL_NODATA, nodata.to_string().as_str())
            .map_err(tiff_error("Cannot write nodata tag"))?;
    }

    image
        .write_data(&data)
        .map_err(tiff_error("Cannot write image data"))?;
    Ok(())
}

/// GeoKey directory: version 1.1.0 followed by `[key, location, count, value]`
/// entries. EPSG 4326 and other geographic codes are written as a geographic
/// model, anything else as projected.
fn geo_keys(crs: Option<&CRS>) -> Vec<u16> {
    let epsg = crs.and_then(CRS::epsg).and_then(|c| u16::try_from(c).ok());
    let geographic = matches!(epsg, Some(4000..=4999));

    let mut keys = vec![
        GT_MODEL_TYPE, 0, 1, if geographic { 2 } else { 1 },
        GT_RASTER_TYPE, 0, 1, 1,
    ];
    if let Some(code) = epsg {
        keys.extend([if geographic { GEOGRAPHIC_TYPE } else { PROJECTED_CS_TYPE }, 0, 1, code]);
    }
    let count = (keys.len() / 4) as u16;
    let mut directory = vec![1, 1, 0, count];
    directory.extend(keys);
    directory
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn sample() -> Raster<f64> {
        let mut raster = Raster::from_vec(vec![1.0, 2.0, 3.0, -9999.0, 5.5, 6.0], 2, 3).unwrap();
        raster.set_transform(GeoTransform::new(100.0, 30.0, 0.5, -0.5));
        raster.set_crs(Some(CRS::wgs84()));
        raster.set_nodata(Some(-9999.0));
        raster
    }

    #[test]
    fn test_buffer_keeps_georeferencing() {
        let buf = write_geotiff_to_buffer(&sample()).unwrap();
        let back: Raster<f64> = read_geotiff_from_buffer(&buf).unwrap();

        assert_eq!(back.shape(), (2, 3));
        assert_relative_eq!(back.get(1, 1).unwrap(), 5.5);
        assert_eq!(back.transform(), &GeoTransform::new(100.0, 30.0, 0.5, -0.5));
        assert_eq!(back.crs().and_then(CRS::epsg), Some(4326));
        assert_eq!(back.nodata(), Some(-9999.0));
        assert!(!back.valid_mask()[(1, 0)]);
    }

    #[test]
    fn test_file_as_integer_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mask.tif");
        let raster = Raster::from_vec(vec![0i32, 7, 7, 0], 2, 2).unwrap();
        write_geotiff(&raster, &path).unwrap();

        let back: Raster<i32> = read_geotiff(&path).unwrap();
        assert_eq!(back.data(), raster.data());
        assert!(back.crs().is_none());
    }

    #[test]
    fn test_geo_keys_layout() {
        assert_eq!(geo_keys(None), vec![1, 1, 0, 2, 1024, 0, 1, 1, 1025, 0, 1, 1]);
        let keys = geo_keys(Some(&CRS::wgs84()));
        assert_eq!(keys[3], 3);
        assert_eq!(&keys[4..8], &[1024, 0, 1, 2]);
        assert_eq!(&keys[12..], &[2048, 0, 1, 4326]);
    }

    #[test]
    fn test_not_a_tiff() {
        assert!(read_geotiff_from_buffer::<f32>(b"not a tiff").is_err());
    }
}
