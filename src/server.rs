use std::sync::Arc;

use anyhow::Context;
use tokio::io::{split, AsyncRead, AsyncWrite, BufReader};
use tokio::net::TcpListener;
use tracing::{debug, info, warn, Instrument};

use crate::config::Config;
use crate::resp::{RESPDecoder, RESPEncoder, RESPError, RESPValue};

/**
 * Turns a decoded request into the reply sent back to the client
 */
pub trait Handler: Send + Sync + 'static {
    fn handle(&self, request: RESPValue) -> RESPValue;
}

impl<F> Handler for F
where
    F: Fn(RESPValue) -> RESPValue + Send + Sync + 'static,
{
    fn handle(&self, request: RESPValue) -> RESPValue {
        self(request)
    }
}

/**
 * Acknowledges every well-formed request with +OK
 */
pub struct Acknowledge;

impl Handler for Acknowledge {
    fn handle(&self, _request: RESPValue) -> RESPValue {
        RESPValue::ok()
    }
}

pub async fn listen<H: Handler>(config: Config, handler: H) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Unable to listen on {}", config.bind_addr))?;
    info!("Listening on {}", listener.local_addr()?);

    serve(listener, Arc::new(config), Arc::new(handler)).await
}

/**
 * Accepts connections forever, each one is served by its own task
 */
pub async fn serve<H: Handler>(
    listener: TcpListener,
    config: Arc<Config>,
    handler: Arc<H>,
) -> anyhow::Result<()> {
    loop {
        match listener.accept().await {
            Ok((socket, addr)) => {
                debug!("Accepted new client: {}", addr);
                let config = Arc::clone(&config);
                let handler = Arc::clone(&handler);

                tokio::spawn(
                    async move {
                        if let Err(err) = handle_connection(socket, &config, handler.as_ref()).await {
                            warn!("Connection closed unexpectedly: {}", err)
                        }
                    }
                    .instrument(tracing::info_span!("connection", peer = %addr)),
                );
            },
            Err(err) => warn!("Couldn't accept client: {}", err),
        }
    }
}

/**
 * Serves one client until it disconnects, goes idle, or sends something that isn't RESP.
 * Protocol errors are reported to the client as an error reply before closing,
 * a client that stalls partway through a request is dropped with an error.
 */
pub async fn handle_connection<S, H>(stream: S, config: &Config, handler: &H) -> Result<(), RESPError>
where
    S: AsyncRead + AsyncWrite + Unpin,
    H: Handler + ?Sized,
{
    let (reader, writer) = split(stream);
    let mut decoder = RESPDecoder::with_config(BufReader::new(reader), config.decoder.clone());
    let mut encoder = RESPEncoder::new(writer);

    loop {
        // Receive in RESP, Respond in RESP
        let next = match config.idle_timeout {
            Some(limit) => decoder.read_timeout(limit).await,
            None => decoder.read().await,
        };

        let request = match next {
            Ok(Some(request)) => request,
            Ok(None) => {
                debug!("Client closed connection");
                return Ok(())
            },
            Err(RESPError::TimedOut { mid_unit: false }) => {
                debug!("Closing idle connection");
                return Ok(())
            },
            Err(err @ RESPError::TimedOut { mid_unit: true }) => {
                warn!("Dropping partially read request: {}", err);
                return Err(err)
            },
            Err(err @ RESPError::Protocol(_)) => {
                warn!("Malformed request: {}", err);
                let reply = RESPValue::error_lossy(&format!("ERR {}", err));
                // The client may already be gone, the protocol error is what gets reported
                let _ = encoder.write(&reply).await;
                return Err(err)
            },
            Err(err) => return Err(err),
        };
        debug!("Request: {}", request);

        let response = handler.handle(request);
        debug!("Response: {}", response);

        encoder.write(&response).await?;
    }
}
