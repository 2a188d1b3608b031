// Backend telemetry and event-history endpoints
//
// Read-only views over what the backend has recorded from the robot:
// latest packets, lifetime totals, and windowed aggregates for charts.

use serde::Deserialize;
use tracing::debug;

use crate::backend::client::BackendClient;
use crate::backend::models::{
    EventsSummaryResponse, LatestTelemetryResponse, OneOrMany, TelemetrySample, TelemetryStats,
    TotalStats,
};
use crate::error::Error;

#[derive(Debug, Deserialize)]
struct TotalStatsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    totals: TotalStats,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    stats: TelemetryStats,
}

#[derive(Debug, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    body: EventsSummaryResponse,
}

impl BackendClient {
    /// Most recent telemetry packets, newest first.
    ///
    /// `GET /api/telemetry/latest[?limit=N]`
    ///
    /// Without a limit the backend chooses its default page size.
    pub async fn latest_telemetry(
        &self,
        limit: Option<u32>,
    ) -> Result<Vec<TelemetrySample>, Error> {
        let mut url = self.api_url("telemetry/latest")?;
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        debug!(?limit, "fetching latest telemetry");
        let resp: LatestTelemetryResponse = self.get(url).await?;
        if !resp.success {
            return Err(Error::Rejected {
                message: resp
                    .message
                    .unwrap_or_else(|| "no telemetry available".into()),
            });
        }
        Ok(resp.data.map(OneOrMany::into_vec).unwrap_or_default())
    }

    /// Newest telemetry packet, if any.
    pub async fn latest_sample(&self) -> Result<Option<TelemetrySample>, Error> {
        Ok(self.latest_telemetry(Some(1)).await?.into_iter().next())
    }

    /// Lifetime totals across all recorded telemetry.
    ///
    /// `GET /api/telemetry/total-stats`
    pub async fn total_stats(&self) -> Result<TotalStats, Error> {
        let url = self.api_url("telemetry/total-stats")?;
        debug!("fetching total stats");
        let resp: TotalStatsResponse = self.get(url).await?;
        if !resp.success {
            return Err(Error::Rejected {
                message: resp
                    .message
                    .unwrap_or_else(|| "total stats unavailable".into()),
            });
        }
        Ok(resp.totals)
    }

    /// Aggregates over the last `hours` hours.
    ///
    /// `GET /api/telemetry/stats?hours=N`
    pub async fn telemetry_stats(&self, hours: u32) -> Result<TelemetryStats, Error> {
        let mut url = self.api_url("telemetry/stats")?;
        url.query_pairs_mut()
            .append_pair("hours", &hours.to_string());
        debug!(hours, "fetching telemetry stats");
        let resp: StatsResponse = self.get(url).await?;
        if !resp.success {
            return Err(Error::Rejected {
                message: resp.message.unwrap_or_else(|| "stats unavailable".into()),
            });
        }
        Ok(resp.stats)
    }

    /// Event counts by category plus the latest events.
    ///
    /// `GET /api/events/summary?hours=N`
    pub async fn events_summary(&self, hours: u32) -> Result<EventsSummaryResponse, Error> {
        let mut url = self.api_url("events/summary")?;
        url.query_pairs_mut()
            .append_pair("hours", &hours.to_string());
        debug!(hours, "fetching events summary");
        let resp: SummaryResponse = self.get(url).await?;
        if !resp.success {
            return Err(Error::Rejected {
                message: resp
                    .message
                    .unwrap_or_else(|| "event summary unavailable".into()),
            });
        }
        Ok(resp.body)
    }
}
