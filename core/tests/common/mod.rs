#![allow(dead_code)]

use axum::body::Body;
use axum::http::{Request, Response};
use dicom_core::{DataElement, PrimitiveValue, Tag, VR};
use dicom_object::meta::FileMetaTableBuilder;
use dicom_object::InMemDicomObject;
use dicomcat_core::dataset::DatasetDecoder;
use dicomcat_core::{DicomcatError, InMemoryDataset, Result};
use std::collections::HashMap;

pub const BOUNDARY: &str = "dicomcat-test-boundary";

/// Decoder that maps exact file contents to prepared datasets
#[derive(Default)]
pub struct FakeDecoder {
    datasets: HashMap<Vec<u8>, InMemoryDataset>,
}

impl FakeDecoder {
    pub fn with(mut self, content: &[u8], dataset: InMemoryDataset) -> Self {
        self.datasets.insert(content.to_vec(), dataset);
        self
    }
}

impl DatasetDecoder for FakeDecoder {
    type Dataset = InMemoryDataset;

    fn decode(&self, bytes: &[u8]) -> Result<InMemoryDataset> {
        self.datasets
            .get(bytes)
            .cloned()
            .ok_or_else(|| DicomcatError::DecodeError("unrecognised content".to_string()))
    }
}

pub fn upload_request(field: &str, file_name: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            BOUNDARY, field, file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/dicom/v1/upload")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

pub fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Builds an explicit VR little endian, 16-bit MONOCHROME2 file
pub fn grayscale_dicom(patient_name: &str, frames: &[Vec<u16>], columns: u16, rows: u16) -> Vec<u8> {
    grayscale_dicom_announcing(patient_name, frames, &frames.len().to_string(), columns, rows)
}

/// Same as [`grayscale_dicom`], with an arbitrary Number of Frames value
pub fn grayscale_dicom_announcing(
    patient_name: &str,
    frames: &[Vec<u16>],
    number_of_frames: &str,
    columns: u16,
    rows: u16,
) -> Vec<u8> {
    let us = |tag: Tag, value: u16| DataElement::new(tag, VR::US, PrimitiveValue::from(value));

    let mut dcm = InMemDicomObject::new_empty();
    dcm.put(DataElement::new(
        Tag(0x0008, 0x0060),
        VR::CS,
        PrimitiveValue::from("MG"),
    ));
    dcm.put(DataElement::new(
        Tag(0x0010, 0x0010),
        VR::PN,
        PrimitiveValue::from(patient_name),
    ));
    dcm.put(us(Tag(0x0028, 0x0002), 1));
    dcm.put(DataElement::new(
        Tag(0x0028, 0x0004),
        VR::CS,
        PrimitiveValue::from("MONOCHROME2"),
    ));
    dcm.put(DataElement::new(
        Tag(0x0028, 0x0008),
        VR::IS,
        PrimitiveValue::from(number_of_frames),
    ));
    dcm.put(us(Tag(0x0028, 0x0010), rows));
    dcm.put(us(Tag(0x0028, 0x0011), columns));
    dcm.put(us(Tag(0x0028, 0x0100), 16));
    dcm.put(us(Tag(0x0028, 0x0101), 16));
    dcm.put(us(Tag(0x0028, 0x0102), 15));
    dcm.put(us(Tag(0x0028, 0x0103), 0));
    let samples: Vec<u16> = frames.iter().flatten().copied().collect();
    dcm.put(DataElement::new(
        Tag(0x7FE0, 0x0010),
        VR::OW,
        PrimitiveValue::U16(samples.into()),
    ));

    let file = dcm
        .with_meta(
            FileMetaTableBuilder::new()
                .transfer_syntax("1.2.840.10008.1.2.1")
                .media_storage_sop_class_uid("1.2.840.10008.5.1.4.1.1.1.2")
                .media_storage_sop_instance_uid("1.2.826.0.1.3680043.2.1125.1"),
        )
        .unwrap();
    let mut bytes = Vec::new();
    file.write_all(&mut bytes).unwrap();
    bytes
}
