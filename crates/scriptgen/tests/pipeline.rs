use std::{fs, sync::Arc};

use scriptgen::{
    GenerateOptions,
    SGResult,
    SequencePredictor,
    TextGenerator,
    Vocab,
    corpus::{CorpusEncoderOptions, PreprocessArtifact, load_corpus_dir},
    predict::{BigramPredictor, BigramPredictorOptions, predictor_path},
    punctuation::PunctuationMap,
    text::clean_and_tokenize,
};

type T = u32;

const SCENE_ONE: &str = "Moe_Szyslak: (Into phone) Moe's Tavern. Where the elite meet to drink.\n\
Bart_Simpson: Eh, yeah, hello, is Mike there? Last name, Rotch.\n\
Moe_Szyslak: (Into phone) Hold on, I'll check. (To barflies) Mike Rotch. Mike Rotch! Hey, has anybody seen Mike Rotch, lately?\n";

const SCENE_TWO: &str = "Homer_Simpson: Hey, Moe. Moe_Szyslak: Hey, Homer. What'll it be?\n\
Homer_Simpson: A beer, Moe. Moe_Szyslak: (Pouring) One beer, coming up.\n";

#[test]
fn test_preprocess_fit_generate() {
    tempdir::TempDir::new("pipeline")
        .and_then(|dir| {
            let corpus_dir = dir.path().join("corpus");
            fs::create_dir(&corpus_dir)?;
            fs::write(corpus_dir.join("01.txt"), SCENE_ONE)?;
            fs::write(corpus_dir.join("02.txt"), SCENE_TWO)?;

            let text = load_corpus_dir(&corpus_dir).unwrap();
            let artifact = CorpusEncoderOptions::default()
                .with_min_frequency(1)
                .init::<T>()
                .encode_text(&text)
                .unwrap();

            let artifact_path = dir.path().join("preprocess.json");
            artifact.save_path(&artifact_path).unwrap();
            let artifact = PreprocessArtifact::<T>::load_path(&artifact_path).unwrap();

            let vocab = artifact.vocab();
            assert!(vocab.contains("moe_szyslak:"));
            assert!(vocab.contains("||period||"));
            assert!(!vocab.contains("tavern"));
            let corpus_tokens = clean_and_tokenize(&text, artifact.punctuation());
            for token in &corpus_tokens {
                let count = corpus_tokens.iter().filter(|t| *t == token).count();
                assert_eq!(vocab.contains(token), count > 1, "{token}");
            }

            let predictor = BigramPredictorOptions::default()
                .with_window_len(6)
                .fit(artifact.encoded(), vocab.len())
                .unwrap();
            let path = predictor_path(&artifact_path);
            predictor.save_path(&path).unwrap();
            let predictor = BigramPredictor::load_path(&path).unwrap();

            let generator = TextGenerator::from_artifact(
                &artifact,
                Arc::new(predictor),
                GenerateOptions::default()
                    .with_window_len(6)
                    .with_predict_len(40)
                    .with_seed(Some(1)),
            )
            .unwrap();

            let script = generator.generate("Moe_Szyslak:").unwrap();
            assert!(script.starts_with("moe_szyslak:"));
            assert_eq!(script, generator.generate_seeded("moe_szyslak:", 1).unwrap());

            let tokens = clean_and_tokenize(&script, generator.punctuation());
            assert_eq!(tokens.len(), 41);
            assert!(tokens.iter().all(|t| vocab.contains(t)));

            Ok(())
        })
        .unwrap();
}

/// Always puts all mass on one id.
struct Always {
    id: usize,
    window_len: usize,
    vocab_size: usize,
}

impl SequencePredictor<T> for Always {
    fn window_len(&self) -> usize {
        self.window_len
    }

    fn vocab_size(&self) -> usize {
        self.vocab_size
    }

    fn predict(
        &self,
        _window: &[T],
    ) -> SGResult<Vec<f32>> {
        let mut scores = vec![0.0; self.vocab_size];
        scores[self.id] = 1.0;
        Ok(scores)
    }
}

#[test]
fn test_the_cat_cat() {
    let vocab: Vocab<T> = Vocab::from_id_to_token(
        vec!["<PAD>".into(), "the".into(), "cat".into(), "sat".into()],
        "<PAD>",
    )
    .unwrap();
    let vocab = Arc::new(vocab);

    let generator = TextGenerator::new(
        vocab.clone(),
        Arc::new(PunctuationMap::default()),
        Arc::new(Always {
            id: 2,
            window_len: 4,
            vocab_size: 4,
        }),
        GenerateOptions::default()
            .with_window_len(4)
            .with_predict_len(2)
            .with_top_k(1),
    )
    .unwrap();

    let mut run = generator.start("the").unwrap();
    let mut rng = <rand::rngs::StdRng as rand::SeedableRng>::seed_from_u64(3);
    while run.step(&mut rng).unwrap().is_some() {}

    assert_eq!(run.tokens(), &["the", "cat", "cat"]);
    assert_eq!(run.window(), &[0, 1, 2, 2]);
    assert_eq!(run.finish(), "the cat cat");

    assert_eq!(generator.generate_seeded("the", 99).unwrap(), "the cat cat");
}
