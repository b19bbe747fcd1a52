use crate::model::ModelGraph;
use anyhow::{anyhow, Context, Result};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

/// Loads the model off the event-loop thread. A failed glTF import falls back to the built-in
/// aircraft so the viewer always ends up with something to show.
pub(crate) struct ModelLoader {
    rx: Option<Receiver<Result<ModelGraph>>>,
}

impl ModelLoader {
    pub(crate) fn spawn(path: Option<PathBuf>) -> Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("model-loader".to_string())
            .spawn(move || {
                let result = match path {
                    Some(path) => ModelGraph::load_gltf(&path),
                    None => Ok(ModelGraph::procedural_aircraft()),
                };
                // the receiver is gone only when the app already shut down
                let _ = tx.send(result);
            })
            .context("Failed to spawn model loader thread")?;
        Ok(Self { rx: Some(rx) })
    }

    pub(crate) fn is_pending(&self) -> bool {
        self.rx.is_some()
    }

    /// Returns the model once, the first time it is available.
    pub(crate) fn poll(&mut self) -> Option<ModelGraph> {
        let rx = self.rx.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(anyhow!("Model loader thread exited without a result")),
        };
        self.rx = None;
        Some(result.unwrap_or_else(|err| {
            log::error!("[model] {err:?}. Showing the built-in aircraft instead.");
            ModelGraph::procedural_aircraft()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn wait_for(loader: &mut ModelLoader) -> ModelGraph {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            if let Some(graph) = loader.poll() {
                return graph;
            }
            assert!(Instant::now() < deadline, "model loader timed out");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn builtin_model_arrives_once() {
        let mut loader = ModelLoader::spawn(None).expect("spawn");
        let graph = wait_for(&mut loader);
        assert!(graph.find_node("Propeller").is_some());
        assert!(!loader.is_pending());
        assert!(loader.poll().is_none());
    }

    #[test]
    fn broken_asset_falls_back_to_builtin() {
        let mut loader = ModelLoader::spawn(Some(PathBuf::from("does/not/exist.glb"))).expect("spawn");
        let graph = wait_for(&mut loader);
        assert_eq!(graph.label(), "procedural aircraft");
    }
}
