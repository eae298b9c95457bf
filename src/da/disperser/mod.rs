pub mod proto;

use async_trait::async_trait;
use tonic::client::Grpc;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tonic_prost::ProstCodec;
use tracing::debug;

use crate::da::Disperser;
use crate::error::Result;
use crate::types::{
    BlobReference, BlobStatus, DispersalReceipt, StatusReply, SubmitReply,
};

const DISPERSE_BLOB: &str = "/disperser.Disperser/DisperseBlob";
const GET_BLOB_STATUS: &str = "/disperser.Disperser/GetBlobStatus";
const RETRIEVE_BLOB: &str = "/disperser.Disperser/RetrieveBlob";

/// gRPC client for a blob disperser
#[derive(Debug, Clone)]
pub struct GrpcDisperser {
    channel: Channel,
}

impl GrpcDisperser {
    /// Build a client without dialling; the connection is made on first use.
    ///
    /// A bare `host:port` is dialled over TLS with the webpki roots. Pass an
    /// explicit `http://` URL to talk plaintext (local test networks).
    pub fn connect_lazy(rpc: &str) -> Result<Self> {
        let uri = if rpc.contains("://") {
            rpc.to_string()
        } else {
            format!("https://{rpc}")
        };

        let mut endpoint = Endpoint::from_shared(uri)?;
        if endpoint.uri().scheme_str() == Some("https") {
            endpoint = endpoint.tls_config(ClientTlsConfig::new().with_webpki_roots())?;
        }
        Ok(Self {
            channel: endpoint.connect_lazy(),
        })
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = Grpc::new(self.channel.clone());
        grpc.ready()
            .await
            .map_err(|e| tonic::Status::unknown(format!("service was not ready: {e}")))?;
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                ProstCodec::default(),
            )
            .await?;
        Ok(response.into_inner())
    }
}

#[async_trait]
impl Disperser for GrpcDisperser {
    async fn submit(&self, data: Vec<u8>) -> Result<SubmitReply> {
        debug!("Dispersing blob of {} bytes", data.len());
        let reply: proto::DisperseBlobReply = self
            .unary(
                DISPERSE_BLOB,
                proto::DisperseBlobRequest {
                    data,
                    ..Default::default()
                },
            )
            .await?;
        Ok(submit_reply(reply))
    }

    async fn poll(&self, receipt: &DispersalReceipt) -> Result<StatusReply> {
        let reply: proto::BlobStatusReply = self
            .unary(
                GET_BLOB_STATUS,
                proto::BlobStatusRequest {
                    request_id: receipt.request_id.clone(),
                },
            )
            .await?;
        Ok(status_reply(reply))
    }

    async fn retrieve(&self, reference: &BlobReference) -> Result<Vec<u8>> {
        let reply: proto::RetrieveBlobReply = self
            .unary(
                RETRIEVE_BLOB,
                proto::RetrieveBlobRequest {
                    batch_header_hash: reference.batch_header_hash.to_vec(),
                    blob_index: reference.blob_index,
                },
            )
            .await?;
        Ok(reply.data)
    }
}

/// Collapse the wire status onto the states the dispersal loop acts on
fn blob_status(raw: i32) -> BlobStatus {
    match proto::BlobStatus::try_from(raw) {
        Ok(proto::BlobStatus::Processing) | Ok(proto::BlobStatus::Dispersing) => {
            BlobStatus::Processing
        }
        Ok(proto::BlobStatus::Confirmed) => BlobStatus::Confirmed,
        Ok(proto::BlobStatus::Finalized) => BlobStatus::Finalized,
        Ok(proto::BlobStatus::Failed) | Ok(proto::BlobStatus::InsufficientSignatures) => {
            BlobStatus::Failed
        }
        Ok(proto::BlobStatus::Unknown) | Err(_) => BlobStatus::Unknown,
    }
}

fn submit_reply(reply: proto::DisperseBlobReply) -> SubmitReply {
    SubmitReply {
        status: blob_status(reply.result),
        receipt: DispersalReceipt {
            request_id: reply.request_id,
        },
    }
}

fn status_reply(reply: proto::BlobStatusReply) -> StatusReply {
    let reference = reply
        .info
        .and_then(|info| info.blob_verification_proof)
        .and_then(|proof| {
            proof.batch_metadata.map(|metadata| BlobReference {
                batch_header_hash: metadata.batch_header_hash.into(),
                blob_index: proof.blob_index,
            })
        });
    StatusReply {
        status: blob_status(reply.status),
        reference,
    }
}
