use std::sync::Arc;

use parking_lot::RwLock;

use super::{model::HmmModel, trainer::ModelTrainer};
use crate::error::Result;

/// The currently published model.
///
/// Readers take a snapshot with [`SharedModel::current`] and decode against
/// it for as long as they like; publishing swaps the whole `Arc`, so a reader
/// sees either the old model or the new one and never a mix.
#[derive(Debug)]
pub struct SharedModel {
    current: RwLock<Arc<HmmModel>>,
}

impl SharedModel {
    pub fn new(model: HmmModel) -> Self {
        Self {
            current: RwLock::new(Arc::new(model)),
        }
    }

    pub fn current(&self) -> Arc<HmmModel> {
        Arc::clone(&self.current.read())
    }

    /// Replaces the published model and returns the previous one.
    pub fn publish(&self, model: HmmModel) -> Arc<HmmModel> {
        let model = Arc::new(model);
        std::mem::replace(&mut *self.current.write(), model)
    }

    /// Trains a new model and publishes it. On error the published model is
    /// left as it was.
    pub fn retrain<I, T, W>(&self, pairs: I) -> Result<Arc<HmmModel>>
    where
        I: IntoIterator<Item = (T, W)>,
        T: AsRef<str>,
        W: AsRef<str>,
    {
        let model = ModelTrainer::train(pairs)?;
        Ok(self.publish(model))
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::{error::Error, hmm::viterbi::ViterbiDecoder};

    #[test]
    fn failed_retrain_keeps_model() {
        let shared = SharedModel::new(ModelTrainer::train([("N V", "dog runs")]).unwrap());
        let before = shared.current();
        let r = shared.retrain([("N V", "dog")]);
        assert!(matches!(r, Err(Error::MalformedCorpusLine { .. })));
        assert!(Arc::ptr_eq(&before, &shared.current()));
        let none: [(&str, &str); 0] = [];
        assert!(matches!(shared.retrain(none), Err(Error::EmptyModel)));
        assert!(Arc::ptr_eq(&before, &shared.current()));
    }

    #[test]
    fn readers_keep_their_snapshot() {
        let shared = SharedModel::new(ModelTrainer::train([("N V", "dog runs")]).unwrap());
        let snapshot = shared.current();
        let old = shared.retrain([("X Y", "dog runs")]).unwrap();
        assert!(Arc::ptr_eq(&old, &snapshot));

        let decoder = ViterbiDecoder::new(&snapshot, -10.0).unwrap();
        assert_eq!(decoder.decode_line("dog runs").unwrap().labels(), ["N", "V"]);
        let latest = shared.current();
        let decoder = ViterbiDecoder::new(&latest, -10.0).unwrap();
        assert_eq!(decoder.decode_line("dog runs").unwrap().labels(), ["X", "Y"]);
    }

    #[test]
    fn concurrent_decoding() {
        let shared = Arc::new(SharedModel::new(
            ModelTrainer::train([("DET N V", "the dog runs")]).unwrap(),
        ));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let shared = Arc::clone(&shared);
                thread::spawn(move || {
                    let model = shared.current();
                    let decoder = ViterbiDecoder::new(&model, -10.0).unwrap();
                    decoder.decode_line("the dog runs").unwrap().tags
                })
            })
            .collect();
        shared.publish(ModelTrainer::train([("DET N V", "a cat sleeps")]).unwrap());
        for h in handles {
            assert_eq!(h.join().unwrap().len(), 3);
        }
    }
}
