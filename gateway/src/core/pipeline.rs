//! One conversational turn: transcribe → generate → synthesize → stream back.
//!
//! Every entry point takes the session's [`TurnPermit`] by value and holds it
//! for the whole turn, so the guard is released on every return path,
//! including failures and panics.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::core::audio::{AudioEncoding, AudioFramer, frames_to_linear16};
use crate::core::llm::{FALLBACK_RESPONSE, GenerationOutcome, ResponseGenerator, generate_or_fallback};
use crate::core::session::{Role, Session, SessionEvent, TurnBatch, TurnPermit};
use crate::core::stt::{Transcriber, Transcript, TranscriptReceiver};
use crate::core::tts::{SpeechSynthesizer, SynthesizedAudio};

/// Client-facing message when a batch cannot be transcribed.
pub const TRANSCRIPTION_FAILED_MESSAGE: &str = "Failed to transcribe audio";

/// Client-facing message when reply audio cannot be produced.
pub const SYNTHESIS_FAILED_MESSAGE: &str = "Failed to generate audio response";

/// Upstream services a turn may call. `None` disables the stage.
#[derive(Clone, Default)]
pub struct VoiceProviders {
    pub transcriber: Option<Arc<dyn Transcriber>>,
    pub generator: Option<Arc<dyn ResponseGenerator>>,
    pub synthesizer: Option<Arc<dyn SpeechSynthesizer>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Transcription,
    Generation,
    Synthesis,
}

/// How a turn ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Nothing was said; no upstream call beyond transcription
    EmptyTranscript,
    /// Transcript delivered, generation not configured
    TranscriptOnly,
    /// Reply delivered as text, synthesis not configured
    TextOnly,
    /// Reply streamed as audio
    Spoken { frames: usize },
    /// A required stage is not configured
    Unavailable(PipelineStage),
    /// A stage failed and an error was reported to the client
    Failed(PipelineStage),
    /// The session closed before the turn finished; results were discarded
    Abandoned,
}

pub struct VoicePipeline {
    providers: VoiceProviders,
    frame_ms: u32,
}

impl VoicePipeline {
    pub fn new(providers: VoiceProviders, frame_ms: u32) -> Self {
        Self {
            providers,
            frame_ms,
        }
    }

    pub fn providers(&self) -> &VoiceProviders {
        &self.providers
    }

    /// Run a turn for a batch taken from the session buffer.
    pub async fn run_batch(&self, session: &Arc<Session>, batch: TurnBatch) -> TurnOutcome {
        let TurnBatch { permit, frames } = batch;

        let Some(transcriber) = self.providers.transcriber.as_ref() else {
            debug!(session = %session.key(), frames = frames.len(), "No transcriber configured, dropping batch");
            return TurnOutcome::Unavailable(PipelineStage::Transcription);
        };

        let audio = Bytes::from(frames_to_linear16(&frames));
        debug!(
            session = %session.key(),
            frames = frames.len(),
            bytes = audio.len(),
            "Transcribing batch"
        );

        let transcript = match transcriber.transcribe(audio, AudioEncoding::Linear16).await {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(session = %session.key(), "Transcription failed: {}", e);
                session
                    .emit(SessionEvent::Error {
                        message: TRANSCRIPTION_FAILED_MESSAGE.to_string(),
                    })
                    .await;
                return TurnOutcome::Failed(PipelineStage::Transcription);
            }
        };

        self.respond(session, transcript, permit).await
    }

    /// Run the rest of a turn for an already-final transcript.
    pub async fn respond(
        &self,
        session: &Arc<Session>,
        transcript: Transcript,
        _permit: TurnPermit,
    ) -> TurnOutcome {
        if transcript.is_blank() {
            debug!(session = %session.key(), "Empty transcript, skipping turn");
            return TurnOutcome::EmptyTranscript;
        }
        if session.is_closed() {
            return TurnOutcome::Abandoned;
        }

        let user_text = transcript.text.trim().to_string();
        info!(session = %session.key(), text = %user_text, "User said");
        session.context().append(Role::User, user_text.clone());

        let transcript_event = SessionEvent::Transcript {
            text: user_text,
            confidence: transcript.confidence,
        };

        let Some(generator) = self.providers.generator.as_ref() else {
            session.emit(transcript_event).await;
            return TurnOutcome::TranscriptOnly;
        };

        let identity = session.identity();
        let history = session.context().snapshot();
        let reply = match generate_or_fallback(generator.as_ref(), &identity.persona, &history).await {
            GenerationOutcome::Generated(text) => text,
            GenerationOutcome::Fallback { reason } => {
                debug!(session = %session.key(), %reason, "Reporting generation fallback");
                session
                    .emit(SessionEvent::Error {
                        message: FALLBACK_RESPONSE.to_string(),
                    })
                    .await;
                return TurnOutcome::Failed(PipelineStage::Generation);
            }
        };

        if session.is_closed() {
            return TurnOutcome::Abandoned;
        }
        session.context().append(Role::Agent, reply.clone());
        info!(session = %session.key(), text = %reply, "Agent replied");

        let reply_event = SessionEvent::AgentResponse {
            text: reply.clone(),
        };

        let Some(synthesizer) = self.providers.synthesizer.as_ref() else {
            session.emit(transcript_event).await;
            session.emit(reply_event).await;
            return TurnOutcome::TextOnly;
        };

        let encoding = session.mode().egress_encoding();
        let audio = match synthesizer.synthesize(&reply, &identity.voice_id, encoding).await {
            Ok(audio) => audio,
            Err(e) => {
                warn!(session = %session.key(), voice_id = %identity.voice_id, "Synthesis failed: {}", e);
                session
                    .emit(SessionEvent::Error {
                        message: SYNTHESIS_FAILED_MESSAGE.to_string(),
                    })
                    .await;
                return TurnOutcome::Failed(PipelineStage::Synthesis);
            }
        };

        if session.is_closed() {
            return TurnOutcome::Abandoned;
        }

        let frames = self.stream_audio(session, &audio).await;
        session.emit(transcript_event).await;
        session.emit(reply_event).await;

        TurnOutcome::Spoken { frames }
    }

    /// Frame `audio` for the session's transport and emit it, followed by the
    /// end-of-audio mark. Returns the number of frames sent.
    pub async fn stream_audio(&self, session: &Session, audio: &SynthesizedAudio) -> usize {
        let framer = AudioFramer::new(session.mode().egress_encoding(), self.frame_ms);
        let mut sent = 0;

        for frame in framer.frames(&audio.data, audio.encoding) {
            if !session.emit(SessionEvent::Audio(frame)).await {
                debug!(session = %session.key(), sent, "Transport gone, stopping audio");
                return sent;
            }
            sent += 1;
        }

        session.emit(SessionEvent::AudioEnd).await;
        debug!(session = %session.key(), frames = sent, "Reply audio streamed");
        sent
    }

    /// Answer each final transcript from a streaming transcriber, one turn at
    /// a time, until the stream ends or the session closes.
    pub async fn run_transcripts(&self, session: Arc<Session>, mut transcripts: TranscriptReceiver) {
        while let Some(transcript) = transcripts.recv().await {
            if session.is_closed() {
                break;
            }
            match session.wait_for_turn().await {
                Some(permit) => {
                    let outcome = self.respond(&session, transcript, permit).await;
                    debug!(session = %session.key(), ?outcome, "Streaming turn finished");
                }
                None => {
                    warn!(
                        session = %session.key(),
                        phase = %session.phase(),
                        "Session no longer active, dropping transcript"
                    );
                }
            }
        }
        debug!(session = %session.key(), "Transcript stream ended");
    }
}
