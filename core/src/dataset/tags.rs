use dicom_core::Tag;
use dicom_object::InMemDicomObject;

// Image Pixel Module Tags
pub const SAMPLES_PER_PIXEL: Tag = Tag(0x0028, 0x0002);
pub const PHOTOMETRIC_INTERPRETATION: Tag = Tag(0x0028, 0x0004);
pub const PLANAR_CONFIGURATION: Tag = Tag(0x0028, 0x0006);
pub const NUMBER_OF_FRAMES: Tag = Tag(0x0028, 0x0008);
pub const ROWS: Tag = Tag(0x0028, 0x0010);
pub const COLUMNS: Tag = Tag(0x0028, 0x0011);
pub const BITS_ALLOCATED: Tag = Tag(0x0028, 0x0100);
pub const PIXEL_REPRESENTATION: Tag = Tag(0x0028, 0x0103);
pub const PIXEL_DATA: Tag = Tag(0x7FE0, 0x0010);

// File Meta Tags
pub const MEDIA_STORAGE_SOP_CLASS_UID: Tag = Tag(0x0002, 0x0002);
pub const MEDIA_STORAGE_SOP_INSTANCE_UID: Tag = Tag(0x0002, 0x0003);
pub const TRANSFER_SYNTAX_UID: Tag = Tag(0x0002, 0x0010);
pub const IMPLEMENTATION_CLASS_UID: Tag = Tag(0x0002, 0x0012);

// Identification Tags
pub const PATIENT_NAME: Tag = Tag(0x0010, 0x0010);

/// Helper to get integer value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to i32
pub fn get_int_value(dcm: &InMemDicomObject, tag: Tag) -> Option<i32> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<i32>().ok())
}

/// Helper to get u16 value from DICOM tag
///
/// Returns `None` if the tag is not present or cannot be converted to u16
pub fn get_u16_value(dcm: &InMemDicomObject, tag: Tag) -> Option<u16> {
    dcm.element(tag)
        .ok()
        .and_then(|elem| elem.to_int::<u16>().ok())
}
