// Wire types of the `disperser.Disperser` gRPC service.
// Only the fields this crate reads are declared; prost skips the rest.

/// Status of a blob as tracked by the disperser
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum BlobStatus {
    Unknown = 0,
    Processing = 1,
    Confirmed = 2,
    Failed = 3,
    Finalized = 4,
    InsufficientSignatures = 5,
    Dispersing = 6,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisperseBlobRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
    #[prost(uint32, repeated, tag = "2")]
    pub custom_quorum_numbers: Vec<u32>,
    #[prost(string, tag = "3")]
    pub account_id: String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct DisperseBlobReply {
    #[prost(enumeration = "BlobStatus", tag = "1")]
    pub result: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub request_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobStatusRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub request_id: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobStatusReply {
    #[prost(enumeration = "BlobStatus", tag = "1")]
    pub status: i32,
    #[prost(message, optional, tag = "2")]
    pub info: Option<BlobInfo>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobInfo {
    #[prost(message, optional, tag = "2")]
    pub blob_verification_proof: Option<BlobVerificationProof>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BlobVerificationProof {
    #[prost(uint32, tag = "1")]
    pub batch_id: u32,
    #[prost(uint32, tag = "2")]
    pub blob_index: u32,
    #[prost(message, optional, tag = "3")]
    pub batch_metadata: Option<BatchMetadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BatchMetadata {
    #[prost(uint32, tag = "4")]
    pub confirmation_block_number: u32,
    #[prost(bytes = "vec", tag = "5")]
    pub batch_header_hash: Vec<u8>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetrieveBlobRequest {
    #[prost(bytes = "vec", tag = "1")]
    pub batch_header_hash: Vec<u8>,
    #[prost(uint32, tag = "2")]
    pub blob_index: u32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct RetrieveBlobReply {
    #[prost(bytes = "vec", tag = "1")]
    pub data: Vec<u8>,
}
