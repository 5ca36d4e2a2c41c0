//! Response assembly
//!
//! Fans plan messages out to synthesis and cue extraction under a
//! bounded concurrency cap, then merges audio and cues into assembled
//! messages. A message failing either stage is dropped from the output;
//! siblings are unaffected and input order is preserved.

use std::path::PathBuf;
use std::sync::Arc;

use base64::Engine as _;
use futures::stream::{self, StreamExt};
use tempfile::TempDir;

use avatar_config::PipelineConfig;
use avatar_core::{AssembledMessage, CueExtractor, MessagePlan, Result, Synthesizer};

/// Assembles plan lists into client-ready message payloads
pub struct ResponseAssembler {
    synthesizer: Arc<dyn Synthesizer>,
    extractor: Arc<dyn CueExtractor>,
    max_concurrent: usize,
    scratch_root: Option<PathBuf>,
}

impl ResponseAssembler {
    pub fn new(
        synthesizer: Arc<dyn Synthesizer>,
        extractor: Arc<dyn CueExtractor>,
        config: &PipelineConfig,
    ) -> Self {
        let scratch_root = if config.scratch_root.is_empty() {
            None
        } else {
            Some(PathBuf::from(&config.scratch_root))
        };

        Self {
            synthesizer,
            extractor,
            max_concurrent: config.max_concurrent_messages.max(1),
            scratch_root,
        }
    }

    /// Assemble every plan that survives synthesis and cue extraction
    ///
    /// Output order equals plan order restricted to successes. An empty
    /// plan list or a turn where every message fails yields an empty
    /// vector, never an error.
    pub async fn assemble(&self, plans: Vec<MessagePlan>) -> Result<Vec<AssembledMessage>> {
        if plans.is_empty() {
            return Ok(Vec::new());
        }

        // One scratch directory per turn: no cross-request file
        // collisions, and cleanup happens on drop.
        let scratch = self.scratch_dir()?;
        let scratch_path = scratch.path().to_path_buf();

        // `buffered` caps in-flight messages and yields in input order.
        let assembled: Vec<Option<AssembledMessage>> = stream::iter(
            plans.into_iter().enumerate().map(|(index, plan)| {
                let audio_path = scratch_path.join(format!("message_{index}.mp3"));
                self.assemble_one(index, plan, audio_path)
            }),
        )
        .buffered(self.max_concurrent)
        .collect()
        .await;

        Ok(assembled.into_iter().flatten().collect())
    }

    async fn assemble_one(
        &self,
        index: usize,
        plan: MessagePlan,
        audio_path: PathBuf,
    ) -> Option<AssembledMessage> {
        match self.process(&plan, &audio_path).await {
            Ok((audio, lipsync)) => Some(AssembledMessage::from_plan(plan, audio, lipsync)),
            Err(e) => {
                tracing::warn!(message_index = index, "dropping message from response: {e}");
                None
            }
        }
    }

    async fn process(
        &self,
        plan: &MessagePlan,
        audio_path: &std::path::Path,
    ) -> Result<(String, avatar_core::LipSync)> {
        self.synthesizer.synthesize(&plan.text, audio_path).await?;
        let lipsync = self.extractor.extract(audio_path).await?;

        let audio_bytes = tokio::fs::read(audio_path).await?;
        let audio = base64::engine::general_purpose::STANDARD.encode(audio_bytes);

        Ok((audio, lipsync))
    }

    fn scratch_dir(&self) -> Result<TempDir> {
        let dir = match &self.scratch_root {
            Some(root) => {
                std::fs::create_dir_all(root)?;
                TempDir::new_in(root)?
            }
            None => TempDir::new()?,
        };
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::path::Path;

    use avatar_core::{Error, LipSync, MouthCue};

    /// Writes a tiny fake MP3 and optionally fails for chosen indices
    struct FakeSynthesizer {
        fail_texts: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeSynthesizer {
        fn new(fail_texts: &[&str]) -> Self {
            Self {
                fail_texts: fail_texts.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Synthesizer for FakeSynthesizer {
        async fn synthesize(&self, text: &str, target: &Path) -> Result<()> {
            self.calls.lock().push(text.to_string());
            if self.fail_texts.contains(text) {
                return Err(Error::Synthesis("synthetic failure".to_string()));
            }
            tokio::fs::write(target, text.as_bytes()).await?;
            Ok(())
        }
    }

    /// Deterministic cue extractor keyed off the audio file length
    struct FakeExtractor {
        fail: bool,
    }

    #[async_trait]
    impl CueExtractor for FakeExtractor {
        async fn extract(&self, audio: &Path) -> Result<LipSync> {
            if self.fail {
                return Err(Error::CueExtraction("synthetic failure".to_string()));
            }
            let len = tokio::fs::metadata(audio).await?.len() as f64;
            Ok(LipSync {
                mouth_cues: vec![MouthCue {
                    value: "X".to_string(),
                    start: 0.0,
                    end: len / 10.0,
                }],
            })
        }
    }

    fn assembler(fail_texts: &[&str], fail_extract: bool) -> ResponseAssembler {
        ResponseAssembler::new(
            Arc::new(FakeSynthesizer::new(fail_texts)),
            Arc::new(FakeExtractor { fail: fail_extract }),
            &PipelineConfig::default(),
        )
    }

    fn plans(texts: &[&str]) -> Vec<MessagePlan> {
        texts.iter().map(|t| MessagePlan::new(*t)).collect()
    }

    #[tokio::test]
    async fn test_all_success_preserves_order() {
        let assembler = assembler(&[], false);
        let result = assembler.assemble(plans(&["a", "b", "c"])).await.unwrap();

        let texts: Vec<_> = result.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "b", "c"]);
        assert!(result.iter().all(|m| !m.audio.is_empty()));
    }

    #[tokio::test]
    async fn test_partial_failure_drops_only_failed() {
        let assembler = assembler(&["b"], false);
        let result = assembler
            .assemble(plans(&["a", "b", "c", "d"]))
            .await
            .unwrap();

        let texts: Vec<_> = result.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["a", "c", "d"]);
    }

    #[tokio::test]
    async fn test_empty_plan_yields_empty_output() {
        let assembler = assembler(&[], false);
        let result = assembler.assemble(Vec::new()).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_all_failures_yield_empty_output() {
        let assembler = assembler(&["a", "b"], false);
        let result = assembler.assemble(plans(&["a", "b"])).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_extraction_failure_drops_message_like_synthesis() {
        // Uniform soft-failure policy for both stages
        let assembler = assembler(&[], true);
        let result = assembler.assemble(plans(&["a", "b"])).await.unwrap();
        assert!(result.is_empty());
    }

    #[tokio::test]
    async fn test_assembly_is_deterministic() {
        let assembler = assembler(&[], false);
        let first = assembler.assemble(plans(&["a", "bb"])).await.unwrap();
        let second = assembler.assemble(plans(&["a", "bb"])).await.unwrap();

        let cues = |msgs: &[AssembledMessage]| -> Vec<LipSync> {
            msgs.iter().map(|m| m.lipsync.clone()).collect()
        };
        assert_eq!(cues(&first), cues(&second));
    }

    #[tokio::test]
    async fn test_audio_round_trips_through_base64() {
        let assembler = assembler(&[], false);
        let result = assembler.assemble(plans(&["hello"])).await.unwrap();

        let decoded = base64::engine::general_purpose::STANDARD
            .decode(&result[0].audio)
            .unwrap();
        assert_eq!(decoded, b"hello");
        // Fake cues end at len/10; decoded length bounds the duration.
        assert!(result[0].lipsync.duration() <= decoded.len() as f64);
    }
}
