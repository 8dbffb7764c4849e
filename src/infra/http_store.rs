//! REST implementation of the Message Store.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::{de::DeserializeOwned, Deserialize};

use crate::{
    domain::{conversation::Conversation, ids::UserId, message::Message},
    infra::{
        config::ServerConfig,
        error::AppError,
        wire::{ConversationDto, MessageDto, SendMessageRequest},
    },
    usecases::message_store::{MessageStore, MessageStoreError},
};

const STORE_HTTP_UNREACHABLE: &str = "STORE_HTTP_UNREACHABLE";
const STORE_HTTP_STATUS: &str = "STORE_HTTP_STATUS";
const STORE_HTTP_DECODE_FAILED: &str = "STORE_HTTP_DECODE_FAILED";

/// Longest slice of an error body kept in error messages.
const ERROR_BODY_LIMIT: usize = 200;

/// Some deployments wrap payloads as `{"data": ...}`, others return them bare.
#[derive(Deserialize)]
#[serde(untagged)]
enum Envelope<T> {
    Wrapped { data: T },
    Bare(T),
}

impl<T> Envelope<T> {
    fn into_inner(self) -> T {
        match self {
            Self::Wrapped { data } => data,
            Self::Bare(value) => value,
        }
    }
}

pub struct HttpMessageStore {
    client: Client,
    api_base_url: Url,
    token: String,
}

impl std::fmt::Debug for HttpMessageStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpMessageStore")
            .field("api_base_url", &self.api_base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl HttpMessageStore {
    pub fn new(config: &ServerConfig, token: impl Into<String>) -> Result<Self, AppError> {
        let api_base_url = parse_base_url(&config.api_base_url)?;
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(AppError::HttpClientInit)?;

        Ok(Self {
            client,
            api_base_url,
            token: token.into(),
        })
    }

    /// Appends `segments` to the base path, percent-encoding each one.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.api_base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<Response, MessageStoreError> {
        let response = request
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(|error| {
                tracing::warn!(
                    code = STORE_HTTP_UNREACHABLE,
                    operation,
                    error = %error,
                    "message store request failed"
                );
                MessageStoreError::Unavailable(error.to_string())
            })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(
            code = STORE_HTTP_STATUS,
            operation,
            status = status.as_u16(),
            "message store answered with an error status"
        );
        Err(classify_status(status, &body))
    }

    async fn decode<T: DeserializeOwned>(
        operation: &'static str,
        response: Response,
    ) -> Result<T, MessageStoreError> {
        response
            .json::<Envelope<T>>()
            .await
            .map(Envelope::into_inner)
            .map_err(|error| {
                tracing::warn!(
                    code = STORE_HTTP_DECODE_FAILED,
                    operation,
                    error = %error,
                    "message store payload could not be decoded"
                );
                MessageStoreError::InvalidData(error.to_string())
            })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, AppError> {
    let invalid = |details: String| AppError::InvalidApiUrl {
        url: raw.to_owned(),
        details,
    };

    let url = Url::parse(raw).map_err(|error| invalid(error.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("not a hierarchical URL".to_owned()));
    }
    Ok(url)
}

pub(crate) fn classify_status(status: StatusCode, body: &str) -> MessageStoreError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => MessageStoreError::Unauthorized,
        StatusCode::NOT_FOUND => MessageStoreError::NotFound,
        status if status.is_client_error() => {
            MessageStoreError::Rejected(format!("{status}: {}", truncate(body)))
        }
        status => MessageStoreError::Unavailable(format!("{status}: {}", truncate(body))),
    }
}

fn truncate(body: &str) -> &str {
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}

fn convert_all<D, T>(items: Vec<D>) -> Result<Vec<T>, MessageStoreError>
where
    T: TryFrom<D>,
    T::Error: std::fmt::Display,
{
    items
        .into_iter()
        .map(|item| T::try_from(item).map_err(|error| MessageStoreError::InvalidData(error.to_string())))
        .collect()
}

#[async_trait]
impl MessageStore for HttpMessageStore {
    async fn get_conversations(&self) -> Result<Vec<Conversation>, MessageStoreError> {
        const OPERATION: &str = "get_conversations";
        let request = self.client.get(self.url(&["messages", "conversations"]));
        let response = self.execute(OPERATION, request).await?;
        let dtos: Vec<ConversationDto> = Self::decode(OPERATION, response).await?;
        convert_all(dtos)
    }

    async fn get_messages(&self, other_user_id: &UserId) -> Result<Vec<Message>, MessageStoreError> {
        const OPERATION: &str = "get_messages";
        let request = self
            .client
            .get(self.url(&["messages", other_user_id.as_str()]));
        let response = self.execute(OPERATION, request).await?;
        let dtos: Vec<MessageDto> = Self::decode(OPERATION, response).await?;
        convert_all(dtos)
    }

    async fn send_message(
        &self,
        receiver_id: &UserId,
        content: &str,
    ) -> Result<Message, MessageStoreError> {
        const OPERATION: &str = "send_message";
        let body = SendMessageRequest {
            receiver_id: receiver_id.as_str(),
            content,
        };
        let request = self.client.post(self.url(&["messages"])).json(&body);
        let response = self.execute(OPERATION, request).await?;
        let dto: MessageDto = Self::decode(OPERATION, response).await?;
        Message::try_from(dto).map_err(|error| MessageStoreError::InvalidData(error.to_string()))
    }

    async fn mark_read(&self, other_user_id: &UserId) -> Result<(), MessageStoreError> {
        let request = self
            .client
            .put(self.url(&["messages", "read", other_user_id.as_str()]));
        self.execute("mark_read", request).await.map(|_| ())
    }
}
