//! End-to-end ingestion over the redb-backed store, across restarts.

use std::sync::Arc;

use facereg_engine::{
    Detection, EngineConfig, FaceModel, MatchDecision, ModelError, NameDecision,
    RecognitionEngine, Resolver,
};
use facereg_store::{EmbeddingStore, RedbStore};
use tempfile::tempdir;

const DIM: usize = 8;

struct StubModel {
    faces: Vec<Detection>,
}

impl FaceModel for StubModel {
    fn detect(&self, _image: &[u8]) -> Result<Vec<Detection>, ModelError> {
        Ok(self.faces.clone())
    }

    fn dimension(&self) -> usize {
        DIM
    }
}

struct NameOnce(String);

impl Resolver for NameOnce {
    fn confirm_match(
        &self,
        _candidate: &str,
        _similarity: f32,
    ) -> Result<MatchDecision, facereg_engine::EngineError> {
        Ok(MatchDecision::Accept)
    }

    fn name_new_face(&self) -> Result<NameDecision, facereg_engine::EngineError> {
        Ok(NameDecision::Name(self.0.clone()))
    }
}

fn face(embedding: Vec<f32>) -> Detection {
    Detection {
        bounding_box: [0, 0, 64, 64],
        embedding,
        detection_score: 0.97,
    }
}

fn unit(mut v: Vec<f32>) -> Vec<f32> {
    let norm: f64 = v.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>().sqrt();
    for x in &mut v {
        *x = (*x as f64 / norm) as f32;
    }
    v
}

#[test]
fn registry_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("registry.redb");

    let alice = unit(vec![1.0, 0.2, 0.0, 0.0, 0.1, 0.0, 0.0, 0.0]);
    let near_alice = unit(vec![1.0, 0.21, 0.01, 0.0, 0.1, 0.0, 0.0, 0.0]);

    // First run: register alice from one image.
    {
        let store = Arc::new(RedbStore::open(&db_path, DIM).unwrap());
        let engine = RecognitionEngine::open(
            EngineConfig::default(),
            store,
            Box::new(StubModel {
                faces: vec![face(alice.clone())],
            }),
        )
        .unwrap();

        let outcomes = engine
            .process_image("album/one.jpg", b"img", &NameOnce("alice".into()))
            .unwrap();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].person_name, "alice");
    }

    // Second run: the hydrated registry recognizes her and the first
    // image is not reprocessed.
    {
        let store = Arc::new(RedbStore::open(&db_path, DIM).unwrap());
        let engine = RecognitionEngine::open(
            EngineConfig::default(),
            store.clone(),
            Box::new(StubModel {
                faces: vec![face(near_alice.clone())],
            }),
        )
        .unwrap();

        assert!(engine.is_processed("album/one.jpg"));
        let replay = engine
            .process_image("album/one.jpg", b"img", &NameOnce("impostor".into()))
            .unwrap();
        assert!(replay.is_empty());

        let m = engine.match_embedding(&near_alice);
        assert_eq!(m.person_name, "alice");
        assert!(m.similarity > 0.99);

        let outcomes = engine
            .process_image("album/two.jpg", b"img", &NameOnce("impostor".into()))
            .unwrap();
        assert_eq!(outcomes[0].person_name, "alice", "should match, not re-register");

        let stats = engine.stats();
        assert_eq!(stats.unique_people, 1);
        assert_eq!(stats.total_embeddings, 2);
        assert_eq!(stats.processed_images, 2);

        // Both decisions made it into the audit log.
        let log = store.training_log().unwrap();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0].action, "NEW_PERSON");
        assert_eq!(log[1].action, "AUTO_CONFIRMED");
    }

    // Third run: stored vectors come back bit-exact.
    {
        let store = RedbStore::open(&db_path, DIM).unwrap();
        let records = store.load_all().unwrap();
        assert_eq!(records.len(), 2);
        for (got, want) in records[0].vector.iter().zip(alice.iter()) {
            assert_eq!(got.to_bits(), want.to_bits());
        }
    }
}
