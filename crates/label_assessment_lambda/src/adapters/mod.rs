pub mod label_detection;
pub mod rekognition;
