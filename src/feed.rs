//! Exchange-rate push feed over a WebSocket.
//!
//! The feed is fire-and-forget: there is no reconnect, heartbeat, or ordering
//! check. When the socket closes the stream simply ends.

use crate::error::FeedError;
use crate::types::currency::ExchangeRate;
use futures::StreamExt;
use serde::Deserialize;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::{self, Message};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Deserialize, Debug)]
#[serde(tag = "type")]
enum FeedMessage {
    #[serde(rename = "EXCHANGE_RATE_CHANGE")]
    ExchangeRateChange(ExchangeRate),
    #[serde(other)]
    Other,
}

/// Extracts a rate change from a text frame; anything else yields `None`.
pub fn parse_frame(text: &str) -> Option<ExchangeRate> {
    match serde_json::from_str::<FeedMessage>(text) {
        Ok(FeedMessage::ExchangeRateChange(rate)) => Some(rate),
        Ok(FeedMessage::Other) => None,
        Err(err) => {
            tracing::warn!("skipping malformed feed message: {}", err);
            None
        }
    }
}

pub struct CurrencyFeed {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl CurrencyFeed {
    pub async fn connect(url: &str) -> Result<CurrencyFeed, FeedError> {
        let (stream, response) = tokio_tungstenite::connect_async(url).await?;
        tracing::info!("currency feed connected ({})", response.status());
        Ok(CurrencyFeed { stream })
    }

    /// Next rate change, or `None` once the server has closed the feed.
    pub async fn next_rate(&mut self) -> Option<Result<ExchangeRate, FeedError>> {
        while let Some(message) = self.stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    if let Some(rate) = parse_frame(&text) {
                        return Some(Ok(rate));
                    }
                }
                Ok(Message::Close(frame)) => {
                    tracing::info!("currency feed closed by server: {:?}", frame);
                    return None;
                }
                Ok(_) => {}
                Err(err) => return Some(Err(err.into())),
            }
        }
        None
    }

    pub async fn close(mut self) -> Result<(), FeedError> {
        match self.stream.close(None).await {
            Ok(())
            | Err(tungstenite::Error::ConnectionClosed)
            | Err(tungstenite::Error::AlreadyClosed) => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

/// Current rate per currency pair; later updates replace earlier ones in place.
#[derive(Debug, Default)]
pub struct RateBoard {
    rates: Vec<ExchangeRate>,
}

impl RateBoard {
    pub fn apply(&mut self, rate: ExchangeRate) {
        match self
            .rates
            .iter_mut()
            .find(|r| r.from == rate.from && r.to == rate.to)
        {
            Some(existing) => *existing = rate,
            None => self.rates.push(rate),
        }
    }

    pub fn rates(&self) -> &[ExchangeRate] {
        &self.rates
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }
}
