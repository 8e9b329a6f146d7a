//! In-process fake providers
//!
//! Each fake implements one provider trait, counts its calls and can be
//! scripted to fail, so pipeline behavior can be asserted without network
//! access.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use voicebridge_gateway::core::audio::AudioEncoding;
use voicebridge_gateway::core::llm::{LlmError, LlmResult, ResponseGenerator};
use voicebridge_gateway::core::session::Turn;
use voicebridge_gateway::core::stt::{
    STTError, STTResult, StreamingTranscriber, StreamingTranscriberFactory, Transcriber,
    Transcript, TranscriptReceiver,
};
use voicebridge_gateway::core::tts::{SpeechSynthesizer, SynthesizedAudio, TTSError, TTSResult};
use voicebridge_gateway::core::pipeline::VoiceProviders;

// ===== Transcriber =====

/// Batch transcriber returning scripted results in order, then a default.
pub struct FakeTranscriber {
    script: Mutex<VecDeque<Result<String, String>>>,
    default_text: String,
    delay: Duration,
    calls: AtomicUsize,
    bytes_seen: AtomicUsize,
    encodings: Mutex<Vec<AudioEncoding>>,
}

impl FakeTranscriber {
    pub fn saying(text: &str) -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            default_text: text.to_string(),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            bytes_seen: AtomicUsize::new(0),
            encodings: Mutex::new(Vec::new()),
        }
    }

    pub fn silent() -> Self {
        Self::saying("")
    }

    /// Queue a result for the next call; `Err` makes that call fail.
    pub fn then(self, result: Result<&str, &str>) -> Self {
        self.script
            .lock()
            .push_back(result.map(str::to_string).map_err(str::to_string));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn bytes_seen(&self) -> usize {
        self.bytes_seen.load(Ordering::SeqCst)
    }

    pub fn encodings(&self) -> Vec<AudioEncoding> {
        self.encodings.lock().clone()
    }
}

#[async_trait]
impl Transcriber for FakeTranscriber {
    async fn transcribe(&self, audio: Bytes, encoding: AudioEncoding) -> STTResult<Transcript> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bytes_seen.fetch_add(audio.len(), Ordering::SeqCst);
        self.encodings.lock().push(encoding);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let next = self.script.lock().pop_front();
        match next {
            Some(Ok(text)) => Ok(Transcript::new(text, 0.95)),
            Some(Err(e)) => Err(STTError::ProviderError(e)),
            None => Ok(Transcript::new(self.default_text.clone(), 0.95)),
        }
    }

    fn provider_info(&self) -> &'static str {
        "fake-stt"
    }
}

// ===== Response generator =====

#[derive(Debug, Clone)]
pub enum GeneratorBehavior {
    Reply(String),
    Fail,
    Blank,
    Panic,
}

pub struct FakeGenerator {
    behavior: Mutex<GeneratorBehavior>,
    calls: AtomicUsize,
    personas: Mutex<Vec<String>>,
    history_lens: Mutex<Vec<usize>>,
}

impl FakeGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            calls: AtomicUsize::new(0),
            personas: Mutex::new(Vec::new()),
            history_lens: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::new(GeneratorBehavior::Reply(text.to_string()))
    }

    pub fn failing() -> Self {
        Self::new(GeneratorBehavior::Fail)
    }

    pub fn set_behavior(&self, behavior: GeneratorBehavior) {
        *self.behavior.lock() = behavior;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn personas(&self) -> Vec<String> {
        self.personas.lock().clone()
    }

    /// Length of the history passed on each call
    pub fn history_lens(&self) -> Vec<usize> {
        self.history_lens.lock().clone()
    }
}

#[async_trait]
impl ResponseGenerator for FakeGenerator {
    async fn generate(&self, persona: &str, context: &[Turn]) -> LlmResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.personas.lock().push(persona.to_string());
        self.history_lens.lock().push(context.len());

        let behavior = self.behavior.lock().clone();
        match behavior {
            GeneratorBehavior::Reply(text) => Ok(text),
            GeneratorBehavior::Fail => Err(LlmError::ProviderError("quota exceeded".to_string())),
            GeneratorBehavior::Blank => Ok("   ".to_string()),
            GeneratorBehavior::Panic => panic!("generator blew up"),
        }
    }

    fn provider_info(&self) -> &'static str {
        "fake-llm"
    }
}

// ===== Speech synthesizer =====

/// Synthesizer producing silence of a fixed length in the requested encoding.
pub struct FakeSynthesizer {
    duration_ms: u32,
    fail: AtomicBool,
    calls: AtomicUsize,
    voice_ids: Mutex<Vec<String>>,
    encodings: Mutex<Vec<AudioEncoding>>,
}

impl FakeSynthesizer {
    pub fn new(duration_ms: u32) -> Self {
        Self {
            duration_ms,
            fail: AtomicBool::new(false),
            calls: AtomicUsize::new(0),
            voice_ids: Mutex::new(Vec::new()),
            encodings: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        let synth = Self::new(0);
        synth.fail.store(true, Ordering::SeqCst);
        synth
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn voice_ids(&self) -> Vec<String> {
        self.voice_ids.lock().clone()
    }

    pub fn encodings(&self) -> Vec<AudioEncoding> {
        self.encodings.lock().clone()
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(
        &self,
        _text: &str,
        voice_id: &str,
        encoding: AudioEncoding,
    ) -> TTSResult<SynthesizedAudio> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.voice_ids.lock().push(voice_id.to_string());
        self.encodings.lock().push(encoding);

        if self.fail.load(Ordering::SeqCst) {
            return Err(TTSError::ProviderError("voice not found".to_string()));
        }

        let len = encoding.bytes_for_duration(self.duration_ms);
        Ok(SynthesizedAudio::new(vec![0u8; len], encoding))
    }

    fn provider_info(&self) -> &'static str {
        "fake-tts"
    }
}

// ===== Streaming transcription =====

pub struct FakeStreamingTranscriber {
    ready: AtomicBool,
    closes: AtomicUsize,
    bytes_seen: AtomicUsize,
}

impl FakeStreamingTranscriber {
    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn bytes_seen(&self) -> usize {
        self.bytes_seen.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamingTranscriber for FakeStreamingTranscriber {
    async fn send_audio(&self, audio: Bytes) -> STTResult<()> {
        if !self.ready.load(Ordering::SeqCst) {
            return Err(STTError::ConnectionFailed("stream closed".to_string()));
        }
        self.bytes_seen.fetch_add(audio.len(), Ordering::SeqCst);
        Ok(())
    }

    async fn close(&self) -> STTResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        self.ready.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn provider_info(&self) -> &'static str {
        "fake-streaming-stt"
    }
}

/// Factory handing out one stream per open and keeping the transcript
/// senders so tests can play the provider's part.
#[derive(Default)]
pub struct FakeStreamingFactory {
    fail: bool,
    opened: Mutex<Vec<(Arc<FakeStreamingTranscriber>, mpsc::Sender<Transcript>)>>,
}

impl FakeStreamingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            opened: Mutex::new(Vec::new()),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.lock().len()
    }

    /// Stream and transcript sender of the most recent open
    pub fn last(&self) -> Option<(Arc<FakeStreamingTranscriber>, mpsc::Sender<Transcript>)> {
        self.opened.lock().last().cloned()
    }
}

#[async_trait]
impl StreamingTranscriberFactory for FakeStreamingFactory {
    async fn open(
        &self,
        _encoding: AudioEncoding,
    ) -> STTResult<(Arc<dyn StreamingTranscriber>, TranscriptReceiver)> {
        if self.fail {
            return Err(STTError::ConnectionFailed("handshake refused".to_string()));
        }
        let stt = Arc::new(FakeStreamingTranscriber {
            ready: AtomicBool::new(true),
            closes: AtomicUsize::new(0),
            bytes_seen: AtomicUsize::new(0),
        });
        let (tx, rx) = mpsc::channel(16);
        self.opened.lock().push((stt.clone(), tx));
        Ok((stt, rx))
    }
}

// ===== Provider bundle =====

/// Typed handles to the fakes wired into a [`VoiceProviders`].
pub struct FakeProviders {
    pub transcriber: Arc<FakeTranscriber>,
    pub generator: Arc<FakeGenerator>,
    pub synthesizer: Arc<FakeSynthesizer>,
}

impl FakeProviders {
    pub fn new(transcriber: FakeTranscriber, generator: FakeGenerator, synthesizer: FakeSynthesizer) -> Self {
        Self {
            transcriber: Arc::new(transcriber),
            generator: Arc::new(generator),
            synthesizer: Arc::new(synthesizer),
        }
    }

    /// "hello" in, "hi there" out, 100 ms of reply audio
    pub fn conversational() -> Self {
        Self::new(
            FakeTranscriber::saying("hello"),
            FakeGenerator::replying("hi there"),
            FakeSynthesizer::new(100),
        )
    }

    pub fn voice_providers(&self) -> VoiceProviders {
        VoiceProviders {
            transcriber: Some(self.transcriber.clone()),
            generator: Some(self.generator.clone()),
            synthesizer: Some(self.synthesizer.clone()),
        }
    }
}
