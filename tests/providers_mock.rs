//! Provider integration tests against mock HTTP servers.

use futures::StreamExt;
use mockito::Matcher;

use tts_lib_rust::providers::{ElevenLabsTts, FishAudioTts, GptSovitsTts, KokoroTts, OpenAiTts};
use tts_lib_rust::{
    AudioData, AudioFormat, EncodedFormat, Error, SampleType, Samples, SynthesisOptions,
    TtsProvider,
};

fn pcm_fixture(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

#[tokio::test]
async fn openai_synthesize_wraps_pcm_response() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(4800);
    let mock = server
        .mock("POST", "/v1/audio/speech")
        .match_header("authorization", "Bearer test-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "tts-1",
            "input": "Hello, world!",
            "voice": "alloy",
            "response_format": "pcm",
        })))
        .with_status(200)
        .with_body(body.clone())
        .create_async()
        .await;

    let tts = OpenAiTts::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let audio = tts
        .synthesize("Hello, world!", &SynthesisOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(audio.format(), AudioFormat::Pcm);
    assert_eq!(audio.sample_rate(), 24000);
    assert_eq!(audio.as_bytes(EncodedFormat::Pcm).unwrap(), body);
    assert!((audio.duration().unwrap() - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn openai_server_error_maps_to_remote() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let tts = OpenAiTts::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let err = tts
        .synthesize("hi", &SynthesisOptions::default())
        .await
        .unwrap_err();
    match err {
        Error::Remote {
            status, retryable, ..
        } => {
            assert_eq!(status, 500);
            assert!(retryable);
        }
        other => panic!("expected Remote error, got: {other}"),
    }
}

#[tokio::test]
async fn openai_client_error_is_not_retryable() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(401)
        .with_body("{\"error\": \"bad key\"}")
        .create_async()
        .await;

    let tts = OpenAiTts::builder()
        .api_key("wrong-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let err = tts
        .synthesize("hi", &SynthesisOptions::default())
        .await
        .unwrap_err();
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn openai_stream_reassembles_the_payload() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(9600);
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(200)
        .with_body(body.clone())
        .create_async()
        .await;

    let tts = OpenAiTts::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let mut stream = tts
        .synthesize_stream("hi", &SynthesisOptions::default())
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.unwrap();
        assert_eq!(chunk.format(), AudioFormat::Pcm);
        assert_eq!(chunk.sample_rate(), 24000);
        let bytes = chunk.as_bytes(EncodedFormat::Pcm).unwrap();
        // Frame alignment: every chunk is a whole number of 16-bit samples
        assert_eq!(bytes.len() % 2, 0);
        collected.extend_from_slice(&bytes);
    }
    assert_eq!(collected, body);
}

#[tokio::test]
async fn openai_stream_surfaces_http_errors_before_streaming() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/audio/speech")
        .with_status(429)
        .with_body("slow down")
        .create_async()
        .await;

    let tts = OpenAiTts::builder()
        .api_key("test-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let err = tts
        .synthesize_stream("hi", &SynthesisOptions::default())
        .await
        .err()
        .unwrap();
    assert!(err.is_retryable());
}

#[tokio::test]
async fn elevenlabs_sends_key_header_and_format_query() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(44100);
    let mock = server
        .mock("POST", "/v1/text-to-speech/JBFqnCBsd6RMkjVDRZzb")
        .match_header("xi-api-key", "el-key")
        .match_query(Matcher::UrlEncoded(
            "output_format".into(),
            "pcm_22050".into(),
        ))
        .match_body(Matcher::PartialJson(serde_json::json!({
            "text": "Hello",
            "model_id": "eleven_multilingual_v2",
        })))
        .with_status(200)
        .with_body(body.clone())
        .create_async()
        .await;

    let tts = ElevenLabsTts::builder()
        .api_key("el-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let audio = tts
        .synthesize("Hello", &SynthesisOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(audio.sample_rate(), 22050);
    assert_eq!(audio.format(), AudioFormat::Pcm);
    assert!((audio.duration().unwrap() - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn elevenlabs_format_override_changes_rate_and_format() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/text-to-speech/JBFqnCBsd6RMkjVDRZzb")
        .match_query(Matcher::UrlEncoded(
            "output_format".into(),
            "mp3_44100_192".into(),
        ))
        .with_status(200)
        .with_body(vec![0xFFu8, 0xFB, 0x90, 0x00])
        .create_async()
        .await;

    let tts = ElevenLabsTts::builder()
        .api_key("el-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let options = SynthesisOptions::new().with_response_format("mp3_44100_192");
    let audio = tts.synthesize("Hello", &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio.sample_rate(), 44100);
    assert_eq!(audio.format(), AudioFormat::Mp3);
}

#[tokio::test]
async fn elevenlabs_stream_uses_the_stream_endpoint() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(4410);
    let mock = server
        .mock("POST", "/v1/text-to-speech/JBFqnCBsd6RMkjVDRZzb/stream")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(body.clone())
        .create_async()
        .await;

    let tts = ElevenLabsTts::builder()
        .api_key("el-key")
        .base_url(server.url())
        .build()
        .unwrap();

    let mut stream = tts
        .synthesize_stream("Hello", &SynthesisOptions::default())
        .await
        .unwrap();

    let mut total = 0usize;
    while let Some(chunk) = stream.next().await {
        total += chunk.unwrap().byte_len();
    }
    mock.assert_async().await;
    assert_eq!(total, body.len());
}

#[tokio::test]
async fn fishaudio_assembles_prosody_from_scalars() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(8820);
    let mock = server
        .mock("POST", "/v1/tts")
        .match_header("authorization", "Bearer fish-key")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "text": "Hello",
            "format": "pcm",
            "reference_id": "my-voice",
            "prosody": { "speed": 1.5, "volume": 0.0 },
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let tts = FishAudioTts::builder()
        .api_key("fish-key")
        .base_url(server.url())
        .reference_id("my-voice")
        .build()
        .unwrap();

    let options = SynthesisOptions::new().with_speed(1.5);
    let audio = tts.synthesize("Hello", &options).await.unwrap();

    mock.assert_async().await;
    assert_eq!(audio.sample_rate(), 44100);
    assert!((audio.duration().unwrap() - 0.1).abs() < 1e-9);
}

#[tokio::test]
async fn kokoro_speaks_the_openai_wire_shape_without_auth() {
    let mut server = mockito::Server::new_async().await;
    let body = pcm_fixture(2400);
    let mock = server
        .mock("POST", "/v1/audio/speech")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "kokoro",
            "voice": "af_heart",
            "response_format": "pcm",
        })))
        .with_status(200)
        .with_body(body)
        .create_async()
        .await;

    let tts = KokoroTts::builder().base_url(server.url()).build().unwrap();

    let audio = tts
        .synthesize("Hello", &SynthesisOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(audio.sample_rate(), 24000);
    assert_eq!(audio.format(), AudioFormat::Pcm);
}

#[tokio::test]
async fn gptsovits_one_shot_returns_a_parsable_wav() {
    // A real WAV container, built by our own encoder
    let samples: Vec<i16> = (0..3200).map(|i| (i % 100) as i16).collect();
    let wav = AudioData::from_samples(samples.clone(), 32000)
        .unwrap()
        .as_bytes(EncodedFormat::Wav)
        .unwrap();

    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/tts")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "text": "Hello",
            "text_lang": "en",
            "media_type": "wav",
            "streaming_mode": false,
        })))
        .with_status(200)
        .with_body(wav)
        .create_async()
        .await;

    let tts = GptSovitsTts::builder()
        .base_url(server.url())
        .ref_audio_path("refs/voice.wav")
        .build()
        .unwrap();

    let audio = tts
        .synthesize("Hello", &SynthesisOptions::default())
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(audio.format(), AudioFormat::Wav);
    assert!((audio.duration().unwrap() - 0.1).abs() < 1e-9);
    match audio.as_samples(SampleType::I16).unwrap() {
        Samples::I16(v) => assert_eq!(v, samples),
        other => panic!("wrong sample type: {:?}", other.sample_type()),
    }
}

#[tokio::test]
async fn providers_are_interchangeable_behind_the_trait() {
    let mut server = mockito::Server::new_async().await;
    let _speech = server
        .mock("POST", "/v1/audio/speech")
        .with_status(200)
        .with_body(pcm_fixture(480))
        .create_async()
        .await;

    // Same call sites, different constructors.
    let providers: Vec<Box<dyn TtsProvider>> = vec![
        Box::new(
            OpenAiTts::builder()
                .api_key("k")
                .base_url(server.url())
                .build()
                .unwrap(),
        ),
        Box::new(KokoroTts::builder().base_url(server.url()).build().unwrap()),
    ];

    for provider in providers {
        let audio = provider
            .synthesize("Hello", &SynthesisOptions::default())
            .await
            .unwrap();
        assert_eq!(audio.sample_rate(), provider.sample_rate());
        assert_eq!(audio.format(), AudioFormat::Pcm);
    }
}
