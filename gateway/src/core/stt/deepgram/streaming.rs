//! Deepgram live transcription over WebSocket.
//!
//! One connection per telephony session. Audio is queued on a bounded channel
//! and forwarded as binary frames by a connection task; final transcripts are
//! delivered on the receiver returned from [`DeepgramStreamingSTT::connect`].

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Sink, SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::http::header::AUTHORIZATION;
use tokio_tungstenite::tungstenite::protocol::Message;
use tracing::{debug, error, info, warn};

use super::config::DeepgramSTTConfig;
use super::messages::{ControlMessage, StreamingMessage};
use crate::core::audio::AudioEncoding;
use crate::core::stt::base::{
    STTError, STTResult, StreamingTranscriber, StreamingTranscriberFactory, Transcript,
    TranscriptReceiver,
};

// =============================================================================
// Constants
// =============================================================================

/// Time allowed for the WebSocket handshake.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Deepgram drops idle streams after ~10 s without audio or keep-alives.
const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(8);

/// Time allowed for the connection task to flush and exit on close.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const AUDIO_CHANNEL_SIZE: usize = 256;
const RESULT_CHANNEL_SIZE: usize = 64;

// =============================================================================
// Client
// =============================================================================

pub struct DeepgramStreamingSTT {
    audio_tx: mpsc::Sender<Bytes>,
    shutdown_tx: Mutex<Option<oneshot::Sender<()>>>,
    connection_handle: Mutex<Option<JoinHandle<()>>>,
    is_connected: Arc<AtomicBool>,
}

impl DeepgramStreamingSTT {
    /// Open a live stream for audio in `encoding`.
    pub async fn connect(
        config: &DeepgramSTTConfig,
        encoding: AudioEncoding,
    ) -> STTResult<(Self, TranscriptReceiver)> {
        config.validate()?;

        let url = config.streaming_url(encoding)?;
        let mut request = url.as_str().into_client_request().map_err(|e| {
            STTError::ConnectionFailed(format!("Failed to create WebSocket request: {e}"))
        })?;
        let auth = HeaderValue::from_str(&format!("Token {}", config.api_key))
            .map_err(|e| STTError::ConfigurationError(format!("Invalid API key header: {e}")))?;
        request.headers_mut().insert(AUTHORIZATION, auth);

        let (ws_stream, _response) = timeout(CONNECT_TIMEOUT, connect_async(request))
            .await
            .map_err(|_| STTError::ConnectionFailed("Timed out connecting to Deepgram".into()))?
            .map_err(|e| STTError::ConnectionFailed(format!("Failed to connect to Deepgram: {e}")))?;

        info!(model = %config.streaming_model, %encoding, "Connected to Deepgram streaming STT");

        let (audio_tx, audio_rx) = mpsc::channel::<Bytes>(AUDIO_CHANNEL_SIZE);
        let (result_tx, result_rx) = mpsc::channel::<Transcript>(RESULT_CHANNEL_SIZE);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let is_connected = Arc::new(AtomicBool::new(true));

        let connection_handle = tokio::spawn(run_connection(
            ws_stream,
            audio_rx,
            result_tx,
            shutdown_rx,
            is_connected.clone(),
        ));

        Ok((
            Self {
                audio_tx,
                shutdown_tx: Mutex::new(Some(shutdown_tx)),
                connection_handle: Mutex::new(Some(connection_handle)),
                is_connected,
            },
            result_rx,
        ))
    }
}

type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

async fn run_connection(
    ws_stream: WsStream,
    mut audio_rx: mpsc::Receiver<Bytes>,
    result_tx: mpsc::Sender<Transcript>,
    mut shutdown_rx: oneshot::Receiver<()>,
    is_connected: Arc<AtomicBool>,
) {
    let (mut ws_sink, mut ws_stream) = ws_stream.split();
    let mut keep_alive = tokio::time::interval(KEEP_ALIVE_INTERVAL);
    keep_alive.tick().await;

    loop {
        tokio::select! {
            audio = audio_rx.recv() => {
                let Some(audio) = audio else {
                    debug!("Audio channel closed, finishing Deepgram stream");
                    send_control(&mut ws_sink, ControlMessage::CloseStream).await;
                    break;
                };
                let len = audio.len();
                if let Err(e) = ws_sink.send(Message::Binary(audio)).await {
                    error!("Failed to send audio to Deepgram: {}", e);
                    break;
                }
                debug!("Sent {} bytes of audio to Deepgram", len);
            }

            _ = keep_alive.tick() => {
                send_control(&mut ws_sink, ControlMessage::KeepAlive).await;
            }

            message = ws_stream.next() => {
                match message {
                    Some(Ok(Message::Text(text))) => {
                        if !forward_results(&text, &result_tx).await {
                            debug!("Transcript receiver dropped");
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        info!("Deepgram closed the stream: {:?}", frame);
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        error!("Deepgram WebSocket error: {}", e);
                        break;
                    }
                    None => {
                        info!("Deepgram WebSocket stream ended");
                        break;
                    }
                }
            }

            _ = &mut shutdown_rx => {
                info!("Received shutdown signal for Deepgram STT");
                send_control(&mut ws_sink, ControlMessage::CloseStream).await;
                let _ = ws_sink.send(Message::Close(None)).await;
                break;
            }
        }
    }

    is_connected.store(false, Ordering::Release);
    info!("Deepgram STT WebSocket connection closed");
}

async fn send_control<S>(ws_sink: &mut S, control: ControlMessage)
where
    S: Sink<Message> + Unpin,
    S::Error: std::fmt::Display,
{
    match serde_json::to_string(&control) {
        Ok(json) => {
            if let Err(e) = ws_sink.send(Message::Text(json.into())).await {
                warn!("Failed to send {:?} to Deepgram: {}", control, e);
            }
        }
        Err(e) => warn!("Failed to serialize {:?}: {}", control, e),
    }
}

/// Forward final, non-empty transcripts. Returns false if the receiver is gone.
async fn forward_results(text: &str, result_tx: &mpsc::Sender<Transcript>) -> bool {
    match serde_json::from_str::<StreamingMessage>(text) {
        Ok(StreamingMessage::Results(results)) if results.is_final => {
            let transcript = results.transcript();
            if transcript.is_blank() {
                return true;
            }
            debug!(
                text = %transcript.text,
                confidence = transcript.confidence,
                "Deepgram final transcript"
            );
            result_tx.send(transcript).await.is_ok()
        }
        Ok(StreamingMessage::UtteranceEnd) => {
            debug!("Deepgram utterance end");
            true
        }
        Ok(_) => true,
        Err(e) => {
            warn!("Failed to parse Deepgram message: {}", e);
            true
        }
    }
}

#[async_trait]
impl StreamingTranscriber for DeepgramStreamingSTT {
    async fn send_audio(&self, audio: Bytes) -> STTResult<()> {
        if !self.is_ready() {
            return Err(STTError::ConnectionFailed(
                "Not connected to Deepgram STT".to_string(),
            ));
        }
        self.audio_tx
            .send(audio)
            .await
            .map_err(|e| STTError::NetworkError(format!("Failed to send audio data: {e}")))
    }

    async fn close(&self) -> STTResult<()> {
        let shutdown_tx = self.shutdown_tx.lock().take();
        let Some(shutdown_tx) = shutdown_tx else {
            return Ok(());
        };
        let _ = shutdown_tx.send(());

        let handle = self.connection_handle.lock().take();
        if let Some(handle) = handle
            && timeout(SHUTDOWN_TIMEOUT, handle).await.is_err()
        {
            warn!("Deepgram connection task did not stop in time");
        }

        self.is_connected.store(false, Ordering::Release);
        info!("Disconnected from Deepgram STT");
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.is_connected.load(Ordering::Acquire)
    }

    fn provider_info(&self) -> &'static str {
        "deepgram"
    }
}

impl Drop for DeepgramStreamingSTT {
    fn drop(&mut self) {
        if let Some(shutdown_tx) = self.shutdown_tx.lock().take() {
            let _ = shutdown_tx.send(());
        }
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Opens one [`DeepgramStreamingSTT`] per telephony session.
#[derive(Debug, Clone)]
pub struct DeepgramStreamingFactory {
    config: DeepgramSTTConfig,
}

impl DeepgramStreamingFactory {
    pub fn new(config: DeepgramSTTConfig) -> STTResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }
}

#[async_trait]
impl StreamingTranscriberFactory for DeepgramStreamingFactory {
    async fn open(
        &self,
        encoding: AudioEncoding,
    ) -> STTResult<(Arc<dyn StreamingTranscriber>, TranscriptReceiver)> {
        let (stt, results) = DeepgramStreamingSTT::connect(&self.config, encoding).await?;
        Ok((Arc::new(stt), results))
    }
}
