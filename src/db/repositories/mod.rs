pub mod blobs;
