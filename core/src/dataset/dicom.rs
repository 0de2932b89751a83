use super::tags::{
    get_int_value, get_u16_value, BITS_ALLOCATED, COLUMNS, IMPLEMENTATION_CLASS_UID,
    MEDIA_STORAGE_SOP_CLASS_UID, MEDIA_STORAGE_SOP_INSTANCE_UID, NUMBER_OF_FRAMES, PIXEL_DATA,
    PIXEL_REPRESENTATION, PLANAR_CONFIGURATION, ROWS, SAMPLES_PER_PIXEL, TRANSFER_SYNTAX_UID,
};
use super::{DatasetDecoder, DatasetElement, StudyDataset};
use crate::error::{DicomcatError, Result};
use crate::types::PixelFrame;
use dicom_core::header::Header;
use dicom_core::value::Value;
use dicom_core::VR;
use dicom_object::mem::InMemElement;
use dicom_object::DefaultDicomObject;
use dicom_pixeldata::PixelDecoder;
use log::warn;
use std::panic::{self, AssertUnwindSafe};

/// Offset of the "DICM" magic code after the file preamble
const PREAMBLE_LEN: usize = 128;
const MAGIC: &[u8; 4] = b"DICM";

/// Decoder for DICOM Part 10 files
#[derive(Debug, Clone, Copy, Default)]
pub struct DicomDecoder;

impl DatasetDecoder for DicomDecoder {
    type Dataset = DicomDataset;

    /// Decodes a DICOM file held in memory
    ///
    /// Files are accepted with or without the 128-byte preamble, but must
    /// carry the file meta group.
    fn decode(&self, bytes: &[u8]) -> Result<DicomDataset> {
        let body = if has_preamble(bytes) {
            &bytes[PREAMBLE_LEN..]
        } else {
            bytes
        };
        let obj = dicom_object::from_reader(body)
            .map_err(|e| DicomcatError::DecodeError(format!("{}", e)))?;
        Ok(DicomDataset { obj })
    }
}

fn has_preamble(bytes: &[u8]) -> bool {
    bytes.len() >= PREAMBLE_LEN + MAGIC.len() && &bytes[PREAMBLE_LEN..PREAMBLE_LEN + 4] == MAGIC
}

/// A decoded DICOM file
pub struct DicomDataset {
    obj: DefaultDicomObject,
}

impl DicomDataset {
    pub fn new(obj: DefaultDicomObject) -> Self {
        Self { obj }
    }

    fn meta_elements(&self) -> Vec<DatasetElement> {
        let meta = self.obj.meta();
        vec![
            DatasetElement::new(
                MEDIA_STORAGE_SOP_CLASS_UID,
                meta.media_storage_sop_class_uid(),
            ),
            DatasetElement::new(
                MEDIA_STORAGE_SOP_INSTANCE_UID,
                meta.media_storage_sop_instance_uid(),
            ),
            DatasetElement::new(TRANSFER_SYNTAX_UID, meta.transfer_syntax()),
            DatasetElement::new(
                IMPLEMENTATION_CLASS_UID,
                meta.implementation_class_uid.trim_end_matches('\0'),
            ),
        ]
    }

    /// Frames announced by Number of Frames, and frames the pixel data can hold
    fn frames(&self) -> Result<(u32, u32)> {
        let elem = self
            .obj
            .element(PIXEL_DATA)
            .map_err(|_| DicomcatError::NoPixelData)?;

        let announced = match get_int_value(&self.obj, NUMBER_OF_FRAMES) {
            Some(n) if n <= 0 => return Err(DicomcatError::NoFrames),
            Some(n) => n as u32,
            None => 1,
        };

        let capacity = match elem.value() {
            Value::PixelSequence(seq) if !seq.offset_table().is_empty() => {
                seq.offset_table().len()
            }
            Value::PixelSequence(seq) => seq.fragments().len(),
            Value::Primitive(p) => match self.native_frame_size() {
                // dimensions missing: let the decoder report it on frame 0
                0 if p.calculate_byte_len() > 0 => 1,
                0 => 0,
                size => p.calculate_byte_len() / size,
            },
            Value::Sequence(_) => 0,
        };

        let available = announced.min(u32::try_from(capacity).unwrap_or(u32::MAX));
        if available == 0 {
            return Err(DicomcatError::NoFrames);
        }
        Ok((announced, available))
    }

    /// Bytes per frame of native pixel data, as the pixel decoder slices it
    fn native_frame_size(&self) -> usize {
        let attr = |tag| get_u16_value(&self.obj, tag).unwrap_or(0) as usize;
        let samples_per_pixel = get_u16_value(&self.obj, SAMPLES_PER_PIXEL).unwrap_or(1) as usize;
        (attr(BITS_ALLOCATED) + 7) / 8 * samples_per_pixel * attr(ROWS) * attr(COLUMNS)
    }
}

impl StudyDataset for DicomDataset {
    fn elements(&self) -> Vec<DatasetElement> {
        let mut elements = self.meta_elements();
        elements.extend(
            self.obj
                .iter()
                .map(|elem| DatasetElement::new(elem.tag(), render_value(elem))),
        );
        elements
    }

    fn frame_count(&self) -> Result<u32> {
        let (announced, available) = self.frames()?;
        if available < announced {
            warn!(
                "Number of Frames is {} but the pixel data holds {} complete frame(s)",
                announced, available
            );
        }
        Ok(available)
    }

    fn decode_frame(&self, index: u32) -> Result<PixelFrame> {
        let (_, available) = self.frames()?;
        if index >= available {
            return Err(DicomcatError::FrameDecode {
                index,
                reason: format!("pixel data holds {} frame(s)", available),
            });
        }

        let decoded = panic::catch_unwind(AssertUnwindSafe(|| {
            self.obj.decode_pixel_data_frame(index)
        }))
        .map_err(|_| DicomcatError::FrameDecode {
            index,
            reason: "pixel decoder panicked".to_string(),
        })?
        .map_err(|e| DicomcatError::FrameDecode {
            index,
            reason: format!("{}", e),
        })?;

        let layout = SampleLayout {
            columns: decoded.columns(),
            rows: decoded.rows(),
            samples_per_pixel: decoded.samples_per_pixel(),
            bits_allocated: decoded.bits_allocated(),
            signed: get_u16_value(&self.obj, PIXEL_REPRESENTATION) == Some(1),
            planar: get_u16_value(&self.obj, PLANAR_CONFIGURATION) == Some(1),
        };

        let samples = to_gray16(decoded.data(), &layout)
            .map_err(|reason| DicomcatError::FrameDecode { index, reason })?;
        PixelFrame::new(layout.columns, layout.rows, samples).map_err(|e| {
            DicomcatError::FrameDecode {
                index,
                reason: format!("{}", e),
            }
        })
    }
}

/// Renders an element value for display
///
/// Binary payloads are summarised by size instead of being dumped.
fn render_value(elem: &InMemElement) -> String {
    match elem.value() {
        Value::Primitive(p) if is_binary_vr(elem.vr()) => {
            format!("<{}, {} bytes>", elem.vr().to_string(), p.calculate_byte_len())
        }
        Value::Primitive(p) => p.to_str().trim().to_string(),
        Value::Sequence(seq) => format!("[{} items]", seq.items().len()),
        Value::PixelSequence(seq) => format!("[{} fragments]", seq.fragments().len()),
    }
}

fn is_binary_vr(vr: VR) -> bool {
    matches!(vr, VR::OB | VR::OW | VR::OF | VR::OD | VR::OL | VR::OV | VR::UN)
}

/// Memory layout of one decoded frame
struct SampleLayout {
    columns: u32,
    rows: u32,
    samples_per_pixel: u16,
    bits_allocated: u16,
    signed: bool,
    planar: bool,
}

/// Converts decoded little-endian sample bytes into 16-bit grayscale intensities
///
/// 8-bit samples are widened by replication (`x * 0x101`), signed samples are
/// shifted into the unsigned range, and RGB pixels are reduced to luminance.
fn to_gray16(data: &[u8], layout: &SampleLayout) -> std::result::Result<Vec<u16>, String> {
    let pixel_count = layout.columns as usize * layout.rows as usize;
    let spp = layout.samples_per_pixel as usize;

    let raw: Vec<u16> = match layout.bits_allocated {
        8 if layout.signed => data
            .iter()
            .map(|&b| ((b as i8 as i32) + 0x80) as u16 * 0x101)
            .collect(),
        8 => data.iter().map(|&b| b as u16 * 0x101).collect(),
        16 => data
            .chunks_exact(2)
            .map(|c| {
                let v = u16::from_le_bytes([c[0], c[1]]);
                if layout.signed {
                    ((v as i16 as i32) + 0x8000) as u16
                } else {
                    v
                }
            })
            .collect(),
        other => return Err(format!("unsupported bits allocated: {}", other)),
    };

    if raw.len() < pixel_count * spp {
        return Err(format!(
            "frame needs {} samples, decoded {}",
            pixel_count * spp,
            raw.len()
        ));
    }

    match spp {
        1 => Ok(raw[..pixel_count].to_vec()),
        3 => Ok((0..pixel_count)
            .map(|i| {
                let (r, g, b) = if layout.planar {
                    (raw[i], raw[pixel_count + i], raw[2 * pixel_count + i])
                } else {
                    (raw[3 * i], raw[3 * i + 1], raw[3 * i + 2])
                };
                luminance(r, g, b)
            })
            .collect()),
        other => Err(format!("unsupported samples per pixel: {}", other)),
    }
}

/// ITU-R 601 luma on 16-bit channels
fn luminance(r: u16, g: u16, b: u16) -> u16 {
    ((19595 * r as u64 + 38470 * g as u64 + 7471 * b as u64 + (1 << 15)) >> 16) as u16
}
