//! Test doubles: a recording [`ChatOutbound`] and a mock Bot API server.

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering},
};

use {
    async_trait::async_trait,
    axum::{
        Json, Router,
        body::Bytes,
        extract::State,
        http::{StatusCode, Uri},
        routing::post,
    },
    cinebot_config::TmdbConfig,
    cinebot_tmdb::{GenreCache, TmdbClient},
    secrecy::Secret,
    serde_json::{Value, json},
    teloxide::{
        ApiError, Bot, RequestError,
        types::{ChatId, MessageId, ReplyMarkup},
    },
    tokio::{sync::oneshot, task::JoinHandle},
};

use crate::{
    error::{Error, Result},
    outbound::ChatOutbound,
    state::BotContext,
};

// ── Recording outbound ───────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum OutboundCall {
    Text {
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Markdown {
        chat_id: ChatId,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Photo {
        chat_id: ChatId,
        photo_url: String,
        caption: String,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    AnswerCallback {
        callback_id: String,
    },
}

impl OutboundCall {
    /// Text of a text/markdown send, or the caption of a photo.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Text { text, .. } | Self::Markdown { text, .. } | Self::Edit { text, .. } => {
                Some(text)
            },
            Self::Photo { caption, .. } => Some(caption),
            Self::Delete { .. } | Self::AnswerCallback { .. } => None,
        }
    }
}

/// Records every call. Message ids are handed out sequentially from 100.
#[derive(Debug, Default)]
pub struct RecordingOutbound {
    calls: Mutex<Vec<OutboundCall>>,
    next_id: AtomicI32,
    fail_photos: AtomicBool,
    fail_deletes: AtomicBool,
    fail_answers: AtomicBool,
}

impl RecordingOutbound {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI32::new(100),
            ..Default::default()
        }
    }

    pub fn fail_photos(&self) {
        self.fail_photos.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes(&self) {
        self.fail_deletes.store(true, Ordering::SeqCst);
    }

    /// Reject callback answers the way Telegram rejects stale queries.
    pub fn fail_answers(&self) {
        self.fail_answers.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> Vec<OutboundCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: OutboundCall) {
        self.calls.lock().unwrap().push(call);
    }

    fn next_id(&self) -> MessageId {
        MessageId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }
}

fn transport_failure(what: &str) -> Error {
    Error::Telegram(RequestError::Io(std::io::Error::other(format!(
        "{what} failed"
    ))))
}

#[async_trait]
impl ChatOutbound for RecordingOutbound {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        self.record(OutboundCall::Text {
            chat_id,
            text: text.to_string(),
            markup,
        });
        Ok(self.next_id())
    }

    async fn send_markdown(
        &self,
        chat_id: ChatId,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<MessageId> {
        self.record(OutboundCall::Markdown {
            chat_id,
            text: text.to_string(),
            markup,
        });
        Ok(self.next_id())
    }

    async fn send_photo(
        &self,
        chat_id: ChatId,
        photo_url: &str,
        caption: &str,
    ) -> Result<MessageId> {
        self.record(OutboundCall::Photo {
            chat_id,
            photo_url: photo_url.to_string(),
            caption: caption.to_string(),
        });
        if self.fail_photos.load(Ordering::SeqCst) {
            return Err(transport_failure("send photo"));
        }
        Ok(self.next_id())
    }

    async fn edit_text(&self, chat_id: ChatId, message_id: MessageId, text: &str) -> Result<()> {
        self.record(OutboundCall::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        self.record(OutboundCall::Delete {
            chat_id,
            message_id,
        });
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(transport_failure("delete message"));
        }
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str) -> Result<()> {
        self.record(OutboundCall::AnswerCallback {
            callback_id: callback_id.to_string(),
        });
        if self.fail_answers.load(Ordering::SeqCst) {
            return Err(Error::Telegram(RequestError::Api(ApiError::InvalidQueryId)));
        }
        Ok(())
    }
}

/// Handler context backed by `outbound` and a TMDB API at `tmdb_url`.
pub fn test_context(outbound: Arc<RecordingOutbound>, tmdb_url: &str) -> BotContext {
    let tmdb = TmdbClient::new(TmdbConfig {
        api_key: Secret::new("test-key".into()),
        api_base_url: tmdb_url.to_string(),
        timeout_secs: 5,
        ..Default::default()
    })
    .unwrap();
    BotContext::new(outbound, Arc::new(tmdb), Arc::new(GenreCache::new()))
}

// ── Mock Bot API ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TelegramApiMethod {
    SendMessage,
    SendPhoto,
    EditMessageText,
    DeleteMessage,
    AnswerCallbackQuery,
    Other(String),
}

impl TelegramApiMethod {
    fn from_path(path: &str) -> Self {
        let method = path.rsplit('/').next().unwrap_or_default();
        match method {
            "SendMessage" => Self::SendMessage,
            "SendPhoto" => Self::SendPhoto,
            "EditMessageText" => Self::EditMessageText,
            "DeleteMessage" => Self::DeleteMessage,
            "AnswerCallbackQuery" => Self::AnswerCallbackQuery,
            _ => Self::Other(method.to_string()),
        }
    }

    fn returns_message(&self) -> bool {
        matches!(
            self,
            Self::SendMessage | Self::SendPhoto | Self::EditMessageText
        )
    }
}

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub method: TelegramApiMethod,
    pub raw_body: String,
}

impl CapturedRequest {
    /// JSON body; `None` for multipart uploads.
    pub fn json(&self) -> Option<Value> {
        serde_json::from_str(&self.raw_body).ok()
    }
}

#[derive(Clone)]
struct ApiState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    next_message_id: Arc<AtomicI32>,
    rate_limited: Arc<AtomicUsize>,
}

async fn telegram_api_handler(
    State(state): State<ApiState>,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, Json<Value>) {
    let method = TelegramApiMethod::from_path(uri.path());
    state.requests.lock().unwrap().push(CapturedRequest {
        method: method.clone(),
        raw_body: String::from_utf8_lossy(&body).to_string(),
    });

    let limited = state
        .rate_limited
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if limited {
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({
                "ok": false,
                "error_code": 429,
                "description": "Too Many Requests: retry after 1",
                "parameters": { "retry_after": 1 }
            })),
        );
    }

    let result = if method.returns_message() {
        json!({
            "message_id": state.next_message_id.fetch_add(1, Ordering::SeqCst),
            "date": 0,
            "chat": { "id": 42, "type": "private", "first_name": "Alice" },
            "text": "ok"
        })
    } else {
        json!(true)
    };
    (StatusCode::OK, Json(json!({ "ok": true, "result": result })))
}

/// Local HTTP server standing in for `api.telegram.org`.
pub struct MockTelegramApi {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    api_url: reqwest::Url,
    shutdown_tx: oneshot::Sender<()>,
    server: JoinHandle<()>,
}

impl MockTelegramApi {
    pub async fn start() -> Self {
        Self::start_rate_limited(0).await
    }

    /// The first `limited` requests are answered with a 429 `retry_after: 1`.
    pub async fn start_rate_limited(limited: usize) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = ApiState {
            requests: Arc::clone(&requests),
            next_message_id: Arc::new(AtomicI32::new(1)),
            rate_limited: Arc::new(AtomicUsize::new(limited)),
        };
        let app = Router::new()
            .route("/{*path}", post(telegram_api_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind test listener");
        let addr = listener.local_addr().expect("local addr");
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
                .expect("serve mock telegram api");
        });

        let api_url = reqwest::Url::parse(&format!("http://{addr}/")).expect("parse api url");
        Self {
            requests,
            api_url,
            shutdown_tx,
            server,
        }
    }

    pub fn bot(&self) -> Bot {
        Bot::new("test-token").set_api_url(self.api_url.clone())
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_for(&self, method: TelegramApiMethod) -> Vec<CapturedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method)
            .collect()
    }

    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(());
        self.server.await.expect("server join");
    }
}
