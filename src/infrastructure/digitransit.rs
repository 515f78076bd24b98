// Digitransit routing API (GraphQL) adapter
use crate::application::error::AppError;
use crate::application::upstream::{HttpTransport, StopQuery, TransitSource, UpstreamRequest};
use crate::domain::transit::TransitStop;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

pub const PROVIDER: &str = "Digitransit";

const STOPS_QUERY: &str = r#"
query getStops($stopIds: [String], $numberOfDepartures: Int, $startTime: Long, $language: String) {
  stops(ids: $stopIds) {
    name
    gtfsId
    code
    platformCode
    stoptimesWithoutPatterns(numberOfDepartures: $numberOfDepartures, startTime: $startTime, omitCanceled: false) {
      ...stoptimeFields
    }
    alerts {
      ...alertFields
    }
  }
}
fragment stoptimeFields on Stoptime {
  scheduledDeparture
  realtimeDeparture
  departureDelay
  realtime
  realtimeState
  serviceDay
  headsign
  trip {
    gtfsId
    tripHeadsign
    route {
      gtfsId
      mode
      shortName
      longName
      alerts {
        ...alertFields
      }
    }
  }
}
fragment alertFields on Alert {
  id
  alertHash
  alertHeaderText(language: $language)
  alertDescriptionText(language: $language)
  effectiveStartDate
  effectiveEndDate
  alertSeverityLevel
  alertCause
  alertEffect
  entities {
    __typename
    ... on Route {
      gtfsId
      mode
      shortName
      longName
    }
    ... on Stop {
      gtfsId
      code
      name
      vehicleMode
    }
  }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    data: Option<StopsData>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct StopsData {
    // Unknown stop ids come back as nulls
    #[serde(default)]
    stops: Vec<Option<TransitStop>>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

pub struct DigitransitClient {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    region: String,
    api_key: Option<String>,
}

impl DigitransitClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        base_url: impl Into<String>,
        region: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.into(),
            region: region.into(),
            api_key,
        }
    }

    fn url(&self) -> String {
        format!("{}/routing/v2/{}/gtfs/v1", self.base_url, self.region)
    }
}

#[async_trait]
impl TransitSource for DigitransitClient {
    async fn fetch_stops(&self, query: &StopQuery) -> Result<Vec<TransitStop>, AppError> {
        let api_key = self
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| AppError::Configuration("no transportation API key set".to_string()))?;

        let url = self.url();
        let body = json!({
            "query": STOPS_QUERY,
            "variables": {
                "stopIds": query.stop_ids,
                "startTime": query.start_time,
                "numberOfDepartures": query.number_of_departures,
                "language": query.language,
            }
        });
        let request = UpstreamRequest::post_json(&url, &body).with_header("digitransit-subscription-key", api_key);

        info!("Requesting departures for {} stops from '{}'", query.stop_ids.len(), url);
        let response = self.transport.send(PROVIDER, request).await?;
        if !response.is_success() {
            return Err(AppError::status(PROVIDER, "POST", &url, response.status, &response.body));
        }

        let parsed: GraphQlResponse = serde_json::from_slice(&response.body)
            .map_err(|e| AppError::parse(PROVIDER, format!("invalid GraphQL response: {e}")))?;
        let messages: Vec<&str> = parsed.errors.iter().map(|e| e.message.as_str()).collect();

        match parsed.data {
            Some(data) => {
                if !messages.is_empty() {
                    warn!("{} returned partial data with errors: {}", PROVIDER, messages.join("; "));
                }
                Ok(data.stops.into_iter().flatten().collect())
            }
            None => Err(AppError::Upstream {
                provider: PROVIDER.to_string(),
                method: "POST".to_string(),
                url,
                status: Some(response.status),
                message: messages.join("; "),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_transport::fake_transport::FakeTransport;

    fn query() -> StopQuery {
        StopQuery {
            stop_ids: vec!["HSL:1130446".to_string(), "HSL:missing".to_string()],
            start_time: 1_714_546_920,
            number_of_departures: 10,
            language: "en".to_string(),
        }
    }

    fn client(transport: Arc<FakeTransport>, api_key: Option<&str>) -> DigitransitClient {
        DigitransitClient::new(transport, "https://digitransit.test", "hsl", api_key.map(str::to_string))
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let transport = Arc::new(FakeTransport::default());
        let result = client(transport.clone(), None).fetch_stops(&query()).await;

        assert!(matches!(result, Err(AppError::Configuration(_))));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_posts_query_and_drops_null_stops() {
        let transport = Arc::new(FakeTransport::default());
        transport.push(
            200,
            &[("content-type", "application/json")],
            r#"{"data":{"stops":[{"gtfsId":"HSL:1130446","name":"Rautatientori","stoptimesWithoutPatterns":[],"alerts":[]},null]}}"#,
        );

        let stops = client(transport.clone(), Some("key-123")).fetch_stops(&query()).await.unwrap();

        assert_eq!(stops.len(), 1);
        assert_eq!(stops[0].name.as_deref(), Some("Rautatientori"));

        let request = &transport.requests()[0];
        assert_eq!(request.method, "POST");
        assert_eq!(request.url, "https://digitransit.test/routing/v2/hsl/gtfs/v1");
        assert_eq!(
            request.headers.get("digitransit-subscription-key").map(String::as_str),
            Some("key-123")
        );
        let body: serde_json::Value = serde_json::from_slice(request.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["variables"]["numberOfDepartures"], 10);
        assert_eq!(body["variables"]["stopIds"][1], "HSL:missing");
    }

    #[tokio::test]
    async fn test_errors_without_data_are_upstream_errors() {
        let transport = Arc::new(FakeTransport::default());
        transport.push(200, &[], r#"{"errors":[{"message":"Validation error"}]}"#);

        let result = client(transport, Some("key")).fetch_stops(&query()).await;

        match result {
            Err(AppError::Upstream { message, .. }) => assert_eq!(message, "Validation error"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_non_success_status_is_upstream_error() {
        let transport = Arc::new(FakeTransport::default());
        transport.push(401, &[], "Unauthorized");

        let result = client(transport, Some("wrong")).fetch_stops(&query()).await;
        assert!(matches!(result, Err(AppError::Upstream { status: Some(401), .. })));
    }
}
