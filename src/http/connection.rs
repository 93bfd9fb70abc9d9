use bytes::{Buf, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};

use crate::http::parser::{ParseError, parse_http_request};
use crate::http::request::Request;
use crate::http::response::{Response, StatusCode};
use crate::http::writer::ResponseWriter;
use crate::preview::PreviewHandler;

const READ_BUFFER_SIZE: usize = 4096;

pub struct Connection<S> {
    stream: S,
    buffer: BytesMut,
    state: ConnectionState,
    handler: PreviewHandler,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing {
        writer: ResponseWriter,
        keep_alive: bool,
    },
    Closed,
}

/// Result of waiting for the next request on a connection.
pub enum ReadOutcome {
    Request(Request),
    /// Client closed the connection
    Eof,
    /// Request could not be parsed; send this and close
    Rejected(Response),
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, handler: PreviewHandler) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            state: ConnectionState::Reading,
            handler,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match std::mem::replace(&mut self.state, ConnectionState::Closed) {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        ReadOutcome::Request(req) => ConnectionState::Processing(req),
                        ReadOutcome::Eof => ConnectionState::Closed,
                        ReadOutcome::Rejected(response) => ConnectionState::Writing {
                            writer: closing(response),
                            keep_alive: false,
                        },
                    };
                }

                ConnectionState::Processing(req) => {
                    let keep_alive = req.keep_alive();
                    let response = self.handler.handle(&req).await;

                    let writer = if keep_alive {
                        ResponseWriter::new(response)
                    } else {
                        closing(response)
                    };
                    self.state = ConnectionState::Writing { writer, keep_alive };
                }

                ConnectionState::Writing { writer, keep_alive } => {
                    writer.write_to_stream(&mut self.stream).await?;

                    if keep_alive {
                        self.state = ConnectionState::Reading; // go back for next request
                    }
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    pub async fn read_request(&mut self) -> anyhow::Result<ReadOutcome> {
        loop {
            // Try parsing whatever we already have
            match parse_http_request(&self.buffer) {
                Ok((request, consumed)) => {
                    // Remove consumed bytes
                    self.buffer.advance(consumed);
                    return Ok(ReadOutcome::Request(request));
                }

                Err(ParseError::Incomplete) => {
                    // Need more data → fall through to read
                }

                Err(ParseError::HeadersTooLarge) => {
                    tracing::debug!("Request headers too large");
                    return Ok(ReadOutcome::Rejected(Response::empty(
                        StatusCode::HeadersTooLarge,
                    )));
                }

                Err(ParseError::BodyTooLarge) => {
                    tracing::debug!("Request body too large");
                    return Ok(ReadOutcome::Rejected(Response::empty(
                        StatusCode::PayloadTooLarge,
                    )));
                }

                Err(ParseError::InvalidMethod) => {
                    return Ok(ReadOutcome::Rejected(Response::empty(
                        StatusCode::NotImplemented,
                    )));
                }

                Err(e) => {
                    tracing::debug!(error = ?e, "Malformed request");
                    return Ok(ReadOutcome::Rejected(Response::empty(
                        StatusCode::BadRequest,
                    )));
                }
            }

            // Read more data
            let n = self.stream.read_buf(&mut self.buffer).await?;

            if n == 0 {
                // Client closed connection
                return Ok(ReadOutcome::Eof);
            }
        }
    }
}

fn closing(mut response: Response) -> ResponseWriter {
    response
        .headers
        .insert("Connection".to_string(), "close".to_string());
    ResponseWriter::new(response)
}
