use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
use bytes::Bytes;
use rand::Rng;
use sigcraft_types::{
    Encodable, FieldValue, LocationSample, RateLimitInfo, SessionFields, Signature,
    SESSION_HASH_FIELD,
};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::{
    config::{BuilderConfig, ConfigError, EngineSelection, ValidatedConfig},
    encrypt::{encrypt_payload, PayloadEncryptor, SignatureEncoder},
    engine::{EngineKind, HashEngine, HashJob, LocalHashEngine, RemoteHashClient},
    Result,
};

const SESSION_HASH_BYTES: usize = 32;

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}

fn random_session_hash() -> Vec<u8> {
    let mut hash = [0u8; SESSION_HASH_BYTES];
    rand::thread_rng().fill(&mut hash);
    hash.to_vec()
}

/// Session data sent to the hashing server. Text values are read as base64.
fn session_data(fields: &SessionFields) -> std::result::Result<Bytes, ConfigError> {
    match fields.get(SESSION_HASH_FIELD) {
        None => Ok(Bytes::new()),
        Some(FieldValue::Bytes(bytes)) => Ok(Bytes::copy_from_slice(bytes)),
        Some(FieldValue::Text(text)) => B64
            .decode(text.trim())
            .map(Bytes::from)
            .map_err(|err| ConfigError::InvalidSessionHash(err.to_string())),
        Some(other) => Err(ConfigError::InvalidSessionHash(format!("{other:?}"))),
    }
}

/// Per-call values that take precedence over the builder's configuration.
#[derive(Clone, Debug, Default)]
pub struct SignatureOverrides {
    pub time: Option<u64>,
    pub time_since_start: Option<u64>,
    pub unknown25: Option<i64>,
    pub fields: SessionFields,
}

#[derive(Debug)]
enum Engine {
    Local(LocalHashEngine),
    Remote(RemoteHashClient),
}

impl Engine {
    fn as_dyn(&self) -> &dyn HashEngine {
        match self {
            Engine::Local(engine) => engine,
            Engine::Remote(client) => client,
        }
    }
}

/// Assembles request signatures for one session.
///
/// The protocol version and hash engine are fixed at construction; location,
/// auth ticket and session fields may change between builds.
#[derive(Debug)]
pub struct SignatureBuilder {
    config: ValidatedConfig,
    engine: Engine,
    init_time: u64,
    location: LocationSample,
    auth_ticket: Option<Bytes>,
    fields: SessionFields,
}

impl SignatureBuilder {
    pub fn new(config: BuilderConfig) -> Result<Self> {
        let config = config.validate()?;
        let engine = match &config.engine {
            EngineSelection::Local(seed) => Engine::Local(LocalHashEngine::new(*seed)),
            EngineSelection::Remote { endpoint, key } => Engine::Remote(RemoteHashClient::new(
                endpoint,
                key.clone(),
                config.policy.api,
                config.policy.wire,
                config.request_timeout,
            )?),
        };

        let mut fields = config.fields.clone();
        fields
            .entry(SESSION_HASH_FIELD.to_string())
            .or_insert_with(|| random_session_hash().into());

        let builder = Self {
            init_time: config.init_time.unwrap_or_else(now_ms),
            config,
            engine,
            location: LocationSample::default(),
            auth_ticket: None,
            fields,
        };
        debug!(
            version = %builder.config.version,
            engine = %builder.engine_kind(),
            "configured signature builder"
        );
        Ok(builder)
    }

    /// Builder for `version`, hashing remotely when an endpoint and key are
    /// given and the version requires (or only allows) it.
    pub fn configure(
        version: &str,
        hashing_endpoint: Option<&str>,
        hashing_key: Option<&str>,
        fields: SessionFields,
    ) -> Result<Self> {
        Self::new(BuilderConfig {
            version: version.to_string(),
            hashing_endpoint: hashing_endpoint.map(str::to_string),
            hashing_key: hashing_key.map(str::to_string),
            fields,
            ..BuilderConfig::default()
        })
    }

    pub fn version(&self) -> &str {
        &self.config.version
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.as_dyn().kind()
    }

    pub fn set_location(&mut self, lat: f64, lng: f64, accuracy: f64) {
        self.location = LocationSample::new(lat, lng, accuracy);
    }

    pub fn location(&self) -> LocationSample {
        self.location
    }

    /// Set the auth ticket from a message (or raw bytes) via its encoder.
    pub fn set_auth_ticket<T: Encodable + ?Sized>(&mut self, ticket: &T) {
        self.auth_ticket = Some(ticket.encode_to_bytes());
    }

    /// Set an already-encoded auth ticket.
    pub fn set_auth_ticket_bytes(&mut self, ticket: impl Into<Bytes>) {
        self.auth_ticket = Some(ticket.into());
    }

    /// Merge `fields` into the defaults; existing names are replaced.
    pub fn set_fields(&mut self, fields: SessionFields) {
        self.fields.extend(fields);
    }

    pub fn fields(&self) -> &SessionFields {
        &self.fields
    }

    /// Quota state from the last hashing-server response. Always `None` for
    /// local hashing.
    pub fn rate_limit_info(&self) -> Option<RateLimitInfo> {
        match &self.engine {
            Engine::Local(_) => None,
            Engine::Remote(client) => client.rate_limit_info(),
        }
    }

    pub async fn build_signature<I, R>(&self, requests: I) -> Result<Signature>
    where
        I: IntoIterator<Item = R>,
        R: Encodable,
    {
        self.build_signature_with(requests, SignatureOverrides::default())
            .await
    }

    /// Hash `requests` and assemble a [Signature].
    ///
    /// `request_hash[i]` is the hash of the i-th request. Nothing is returned
    /// unless every hash succeeded.
    pub async fn build_signature_with<I, R>(
        &self,
        requests: I,
        overrides: SignatureOverrides,
    ) -> Result<Signature>
    where
        I: IntoIterator<Item = R>,
        R: Encodable,
    {
        let auth_ticket = self
            .auth_ticket
            .clone()
            .ok_or(ConfigError::MissingAuthTicket)?;
        let requests: Vec<Bytes> = requests
            .into_iter()
            .map(|request| request.encode_to_bytes())
            .collect();

        let now = now_ms();
        let timestamp = overrides.time.or(self.config.time).unwrap_or(now);
        let timestamp_since_start = overrides
            .time_since_start
            .or(self.config.time_since_start)
            .unwrap_or_else(|| now.saturating_sub(self.init_time));
        let unknown25 = overrides.unknown25.unwrap_or(self.config.unknown25);

        let mut fields = self.fields.clone();
        fields.extend(overrides.fields);
        let session_hash = session_data(&fields)?;

        let job = HashJob {
            auth_ticket,
            location: self.location,
            timestamp,
            session_hash,
            requests,
        };
        let outcome = self.engine.as_dyn().compute(&job).await?;
        debug!(
            engine = %self.engine_kind(),
            requests = outcome.request_hashes.len(),
            timestamp,
            "built signature"
        );

        Ok(Signature {
            location_hash1: outcome.location_hash1,
            location_hash2: outcome.location_hash2,
            timestamp,
            timestamp_since_start,
            unknown25,
            request_hash: outcome.request_hashes,
            fields,
        })
    }

    /// Build a signature, serialize it with `encoder` and encrypt the result.
    pub async fn encrypt<I, R, S, E>(
        &self,
        requests: I,
        encoder: &S,
        encryptor: &E,
    ) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = R>,
        R: Encodable,
        S: SignatureEncoder + ?Sized,
        E: PayloadEncryptor + ?Sized,
    {
        let signature = self.build_signature(requests).await?;
        let payload = encoder.encode_signature(&signature);
        encrypt_payload(
            encryptor,
            &payload,
            signature.timestamp_since_start,
            &self.config.version,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        test_support::{init_tracing, serve_router},
        BoxError, Error, HashServerErrorKind,
    };
    use axum::{http::StatusCode as AxumStatusCode, routing::post, Router};
    use base64::{engine::general_purpose::STANDARD as B64, Engine as _};
    use sigcraft_types::{FieldValue, HashSeed};
    use std::sync::{Arc, Mutex};

    const TICKET: &[u8] = b"auth-ticket-bytes";

    fn local_config() -> BuilderConfig {
        BuilderConfig {
            init_time: Some(1_000),
            time: Some(5_000),
            ..BuilderConfig::default()
        }
    }

    fn local_builder() -> SignatureBuilder {
        let mut builder = SignatureBuilder::new(local_config()).unwrap();
        builder.set_location(53.0, 18.0, 25.0);
        builder.set_auth_ticket(TICKET);
        builder
    }

    fn golden_requests() -> Vec<Vec<u8>> {
        vec![vec![0x08, 0x02], Vec::new(), vec![0x07; 300]]
    }

    #[tokio::test]
    async fn test_local_build_golden() {
        init_tracing();
        let builder = local_builder();
        assert_eq!(builder.engine_kind(), EngineKind::Local);

        let signature = builder.build_signature(golden_requests()).await.unwrap();
        assert_eq!(signature.location_hash1, 0x2177_78f7);
        assert_eq!(signature.location_hash2, 0x513a_4d48);
        assert_eq!(
            signature.request_hash,
            vec![0x2141_0598_1284_6620, 0x3cb2_82ae_259e_4e38, 0x7091_9189_ecf5_6983]
        );
        assert_eq!(signature.timestamp, 5_000);
        assert_eq!(signature.unknown25, -1_553_869_577_012_279_119);
        assert_eq!(signature.session_hash().map(<[u8]>::len), Some(SESSION_HASH_BYTES));
        assert_eq!(builder.rate_limit_info(), None);
    }

    #[tokio::test]
    async fn test_request_hashes_follow_request_order() {
        let builder = local_builder();
        let engine = LocalHashEngine::new(HashSeed::Legacy);
        let requests: Vec<Vec<u8>> = (0..32u8).map(|i| vec![i; i as usize * 9]).collect();

        let signature = builder.build_signature(&requests).await.unwrap();
        let expected: Vec<u64> = requests
            .iter()
            .map(|request| engine.hash_request(TICKET, request).unwrap())
            .collect();
        assert_eq!(signature.request_hash, expected);

        let empty = builder.build_signature(Vec::<Vec<u8>>::new()).await.unwrap();
        assert!(empty.request_hash.is_empty());
        assert_eq!(empty.location_hash1, signature.location_hash1);
    }

    #[tokio::test]
    async fn test_seed_override() {
        let mut builder = SignatureBuilder::new(BuilderConfig {
            hash_seed: Some(HashSeed::Current),
            ..local_config()
        })
        .unwrap();
        builder.set_location(53.0, 18.0, 25.0);
        builder.set_auth_ticket_bytes(Bytes::from_static(TICKET));

        let signature = builder.build_signature([[0x08u8, 0x02]]).await.unwrap();
        assert_eq!(signature.location_hash1, 0xf137_14b4);
        assert_eq!(signature.location_hash2, 0xc319_9da1);
        assert_eq!(signature.request_hash, vec![0x52b8_b6d6_3989_85a6]);
    }

    #[tokio::test]
    async fn test_version_row_selects_seed() {
        let mut builder = SignatureBuilder::new(BuilderConfig {
            version: "0.45.1".to_string(),
            ..local_config()
        })
        .unwrap();
        builder.set_location(53.0, 18.0, 25.0);
        builder.set_auth_ticket(TICKET);

        let signature = builder.build_signature([[0x08u8, 0x02]]).await.unwrap();
        assert_eq!(signature.location_hash2, 0xc319_9da1);
        assert_eq!(signature.request_hash, vec![0x52b8_b6d6_3989_85a6]);

        let mut default = SignatureBuilder::new(BuilderConfig::default()).unwrap();
        default.set_location(53.0, 18.0, 25.0);
        default.set_auth_ticket(TICKET);
        let signature = default.build_signature([[0x08u8, 0x02]]).await.unwrap();
        assert_eq!(signature.location_hash2, 0x513a_4d48);
        assert_eq!(signature.request_hash, vec![0x2141_0598_1284_6620]);
    }

    #[tokio::test]
    async fn test_session_hash_field_forms() {
        let mut builder = local_builder();
        builder.set_fields(SessionFields::from([(
            SESSION_HASH_FIELD.to_string(),
            "AQID".into(),
        )]));
        let job_fields = builder.fields().clone();
        assert_eq!(session_data(&job_fields).unwrap(), Bytes::from_static(&[1, 2, 3]));
        builder.build_signature(golden_requests()).await.unwrap();

        for value in [FieldValue::U64(7), FieldValue::Text("not base64!".into())] {
            let overrides = SignatureOverrides {
                fields: SessionFields::from([(SESSION_HASH_FIELD.to_string(), value)]),
                ..SignatureOverrides::default()
            };
            let err = builder
                .build_signature_with(golden_requests(), overrides)
                .await
                .unwrap_err();
            assert!(matches!(
                err,
                Error::Config(ConfigError::InvalidSessionHash(_))
            ));
        }
    }

    #[test]
    fn test_unknown_version_fails_at_construction() {
        let err = SignatureBuilder::configure(
            "0.99",
            Some("http://127.0.0.1:1"),
            Some("k"),
            SessionFields::new(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::UnknownVersion(_))));
    }

    #[test]
    fn test_engine_selection() {
        let builder = SignatureBuilder::new(BuilderConfig {
            prefer_local: false,
            hashing_endpoint: Some("http://127.0.0.1:1".to_string()),
            hashing_key: Some("k".to_string()),
            ..BuilderConfig::default()
        })
        .unwrap();
        assert_eq!(builder.engine_kind(), EngineKind::Remote);

        let err = SignatureBuilder::configure("0.51", None, None, SessionFields::new()).unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::RemoteNotConfigured { .. })
        ));

        let builder = SignatureBuilder::configure(
            "0.45",
            Some("http://127.0.0.1:1"),
            Some("k"),
            SessionFields::new(),
        )
        .unwrap();
        assert_eq!(builder.engine_kind(), EngineKind::Local);
        assert_eq!(builder.version(), "0.45");
    }

    #[tokio::test]
    async fn test_missing_auth_ticket() {
        let builder = SignatureBuilder::new(local_config()).unwrap();
        let err = builder.build_signature(golden_requests()).await.unwrap_err();
        assert!(matches!(err, Error::Config(ConfigError::MissingAuthTicket)));
    }

    #[tokio::test]
    async fn test_field_precedence() {
        let mut defaults = SessionFields::new();
        defaults.insert("a".to_string(), 1u64.into());
        defaults.insert("b".to_string(), 2u64.into());
        defaults.insert(SESSION_HASH_FIELD.to_string(), vec![9u8; 4].into());

        let mut builder = SignatureBuilder::new(BuilderConfig {
            fields: defaults,
            ..local_config()
        })
        .unwrap();
        builder.set_auth_ticket(TICKET);
        builder.set_fields(SessionFields::from([("b".to_string(), 3u64.into())]));

        let overrides = SignatureOverrides {
            fields: SessionFields::from([
                ("b".to_string(), 4u64.into()),
                ("c".to_string(), "x".into()),
            ]),
            ..SignatureOverrides::default()
        };
        let signature = builder
            .build_signature_with(golden_requests(), overrides)
            .await
            .unwrap();
        assert_eq!(signature.field("a"), Some(&FieldValue::U64(1)));
        assert_eq!(signature.field("b"), Some(&FieldValue::U64(4)));
        assert_eq!(signature.field("c"), Some(&FieldValue::Text("x".into())));
        assert_eq!(signature.session_hash(), Some(&[9u8; 4][..]));

        // Per-call fields do not stick.
        assert_eq!(builder.fields().get("b"), Some(&FieldValue::U64(3)));
        assert!(builder.fields().get("c").is_none());
    }

    #[tokio::test]
    async fn test_time_and_unknown25_overrides() {
        let builder = local_builder();
        let signature = builder
            .build_signature_with(
                golden_requests(),
                SignatureOverrides {
                    time: Some(9_000),
                    time_since_start: Some(250),
                    unknown25: Some(42),
                    ..SignatureOverrides::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(signature.timestamp, 9_000);
        assert_eq!(signature.timestamp_since_start, 250);
        assert_eq!(signature.unknown25, 42);

        // Without overrides the elapsed time is measured from init_time.
        let signature = builder.build_signature(golden_requests()).await.unwrap();
        assert_eq!(signature.timestamp, 5_000);
        assert!(signature.timestamp_since_start >= now_ms() - 1_000 - 60_000);
    }

    #[tokio::test]
    async fn test_remote_build() {
        init_tracing();
        let seen = Arc::new(Mutex::new(None));
        let router = Router::new().route(
            "/api/v121_2/hash",
            post({
                let seen = seen.clone();
                move |body: String| async move {
                    let body: serde_json::Value = serde_json::from_str(&body).unwrap();
                    *seen.lock().unwrap() = Some(body);
                    (
                        AxumStatusCode::OK,
                        [("x-raterequestsremaining", "99")],
                        r#"{"locationAuthHash":4294967295,"locationHash":7,"requestHashes":[-1,"9223372036854775808"]}"#,
                    )
                }
            }),
        );
        let (base_url, handle) = serve_router(router).await;

        let mut builder = SignatureBuilder::configure(
            "0.51.0",
            Some(base_url.as_str()),
            Some("key"),
            SessionFields::new(),
        )
        .unwrap();
        assert_eq!(builder.engine_kind(), EngineKind::Remote);
        builder.set_location(53.0, 18.0, 25.0);
        builder.set_auth_ticket(TICKET);

        let signature = builder
            .build_signature([vec![1u8], vec![2u8]])
            .await
            .unwrap();
        assert_eq!(signature.location_hash1, u32::MAX);
        assert_eq!(signature.location_hash2, 7);
        assert_eq!(signature.request_hash, vec![u64::MAX, 1 << 63]);
        assert_eq!(signature.unknown25, -8_832_040_574_896_607_694);
        assert_eq!(
            builder.rate_limit_info().and_then(|info| info.requests_remaining),
            Some(99)
        );

        let body = seen.lock().unwrap().clone().unwrap();
        assert_eq!(body["Timestamp"], signature.timestamp);
        assert_eq!(body["AuthTicket"], B64.encode(TICKET));
        assert_eq!(
            body["SessionData"],
            B64.encode(signature.session_hash().unwrap())
        );
        assert_eq!(body["Requests"], serde_json::json!(["AQ==", "Ag=="]));

        handle.abort();
    }

    // Stub server that hashes with the local engine, so both engines must agree.
    async fn local_hashing_server(seed: HashSeed) -> (String, tokio::task::JoinHandle<()>) {
        let engine = LocalHashEngine::new(seed);
        let router = Router::new().route(
            "/api/v119/hash",
            post(move |body: String| async move {
                let body: serde_json::Value = serde_json::from_str(&body).unwrap();
                let decode = |value: &serde_json::Value| B64.decode(value.as_str().unwrap()).unwrap();
                let ticket = decode(&body["AuthTicket"]);
                let location = LocationSample::new(
                    body["Latitude"].as_f64().unwrap(),
                    body["Longitude"].as_f64().unwrap(),
                    body["Altitude"].as_f64().unwrap(),
                );
                let request_hashes: Vec<String> = body["Requests"]
                    .as_array()
                    .unwrap()
                    .iter()
                    .map(|request| {
                        let hash = engine.hash_request(&ticket, &decode(request)).unwrap();
                        hash.to_string()
                    })
                    .collect();
                format!(
                    r#"{{"locationAuthHash":{},"locationHash":{},"requestHashes":[{}]}}"#,
                    engine.hash_location1(&ticket, &location).unwrap(),
                    engine.hash_location2(&location).unwrap(),
                    request_hashes.join(",")
                )
            }),
        );
        serve_router(router).await
    }

    #[tokio::test]
    async fn test_local_and_remote_agree() {
        let (base_url, handle) = local_hashing_server(HashSeed::Legacy).await;
        let mut remote = SignatureBuilder::new(BuilderConfig {
            prefer_local: false,
            hashing_endpoint: Some(base_url),
            hashing_key: Some("key".to_string()),
            ..local_config()
        })
        .unwrap();
        assert_eq!(remote.engine_kind(), EngineKind::Remote);
        let mut local = local_builder();

        for builder in [&mut remote, &mut local] {
            builder.set_location(40.712_783_7, -74.005_941_3, 10.0);
            builder.set_auth_ticket(TICKET);
            builder.set_fields(SessionFields::from([(
                SESSION_HASH_FIELD.to_string(),
                vec![1u8; 32].into(),
            )]));
        }

        let requests = golden_requests();
        let from_remote = remote.build_signature(&requests).await.unwrap();
        let from_local = local.build_signature(&requests).await.unwrap();
        assert_eq!(from_remote.location_hash1, from_local.location_hash1);
        assert_eq!(from_remote.location_hash2, 0xaed3_9d36);
        assert_eq!(from_remote.request_hash, from_local.request_hash);
        assert_eq!(from_remote.timestamp, from_local.timestamp);
        assert_eq!(from_remote.fields, from_local.fields);

        handle.abort();
    }

    #[tokio::test]
    async fn test_rate_limited_build_fails() {
        let router = Router::new().route(
            "/api/v129_1/hash",
            post(|| async {
                (
                    AxumStatusCode::TOO_MANY_REQUESTS,
                    [("x-raterequestsremaining", "0")],
                    "rate limited",
                )
            }),
        );
        let (base_url, handle) = serve_router(router).await;

        let mut builder = SignatureBuilder::configure(
            "0.61",
            Some(base_url.as_str()),
            Some("key"),
            SessionFields::new(),
        )
        .unwrap();
        builder.set_auth_ticket(TICKET);

        let err = builder.build_signature([vec![1u8]]).await.unwrap_err();
        assert!(err.is_retriable());
        assert!(matches!(
            err,
            Error::HashServer(ref server) if server.kind == HashServerErrorKind::RateLimited
        ));
        assert!(builder.rate_limit_info().unwrap().is_exhausted());

        handle.abort();
    }

    struct Echo;

    impl PayloadEncryptor for Echo {
        fn encrypt(
            &self,
            payload: &[u8],
            timestamp_since_start: u64,
            version: &str,
        ) -> std::result::Result<Vec<u8>, BoxError> {
            if version != "0.45" {
                return Err(format!("unexpected version {version}").into());
            }
            let mut out = timestamp_since_start.to_be_bytes().to_vec();
            out.extend_from_slice(payload);
            Ok(out)
        }
    }

    #[tokio::test]
    async fn test_encrypt() {
        let mut builder = SignatureBuilder::new(BuilderConfig {
            time_since_start: Some(1_234),
            ..local_config()
        })
        .unwrap();
        builder.set_auth_ticket(TICKET);
        builder.set_location(53.0, 18.0, 25.0);

        let encoder = |signature: &Signature| serde_json::to_vec(signature).unwrap();
        let out = builder
            .encrypt(golden_requests(), &encoder, &Echo)
            .await
            .unwrap();
        assert_eq!(&out[..8], &1_234u64.to_be_bytes());
        let decoded: serde_json::Value = serde_json::from_slice(&out[8..]).unwrap();
        assert_eq!(decoded["location_hash1"], 0x2177_78f7u32);
        assert_eq!(decoded["request_hash"][0], 0x2141_0598_1284_6620u64);
    }

    #[tokio::test]
    async fn test_encrypt_keeps_wide_timestamp_exact() {
        let wide = (1u64 << 53) + 1;
        let mut builder = SignatureBuilder::new(BuilderConfig {
            time_since_start: Some(wide),
            ..local_config()
        })
        .unwrap();
        builder.set_auth_ticket(TICKET);

        let encoder = |_: &Signature| Vec::<u8>::new();
        let out = builder
            .encrypt(golden_requests(), &encoder, &Echo)
            .await
            .unwrap();
        assert_eq!(out, wide.to_be_bytes());
    }

    #[tokio::test]
    async fn test_encrypt_propagates_encryptor_error() {
        let mut builder = SignatureBuilder::new(BuilderConfig {
            version: "0.45.2".to_string(),
            ..local_config()
        })
        .unwrap();
        builder.set_auth_ticket(TICKET);

        let encoder = |_: &Signature| Vec::<u8>::new();
        let err = builder
            .encrypt(golden_requests(), &encoder, &Echo)
            .await
            .unwrap_err();
        let Error::Encryption(source) = err else {
            panic!("expected Encryption, got {err:?}");
        };
        assert_eq!(source.to_string(), "unexpected version 0.45.2");
    }
}
