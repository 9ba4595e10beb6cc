use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::client::WechatClient;
use crate::error::{Error, Result};

// Maximum date spans the datacube endpoints accept, in days.
const MAX_USER_SPAN: i64 = 7;
const MAX_READ_SPAN: i64 = 3;
const MAX_SHARE_SPAN: i64 = 7;
const MAX_MSG_SPAN: i64 = 7;
const MAX_MSG_ROLLUP_SPAN: i64 = 30;
const MAX_MSG_DIST_SPAN: i64 = 15;
const MAX_INTERFACE_SPAN: i64 = 30;

#[derive(Debug, Deserialize)]
struct DataList {
    #[serde(default)]
    list: Vec<Value>,
}

/// Read-only datacube analytics queries. Rows come back as raw JSON
/// objects; their fields differ per endpoint and the platform adds new
/// ones without notice.
pub struct Stats<'a> {
    client: &'a WechatClient,
}

impl<'a> Stats<'a> {
    pub(crate) fn new(client: &'a WechatClient) -> Self {
        Self { client }
    }

    /// Daily new/cancelled follower counts.
    pub async fn user_summary(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getusersummary", begin, end, MAX_USER_SPAN)
            .await
    }

    /// Daily cumulative follower counts.
    pub async fn user_cumulate(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getusercumulate", begin, end, MAX_USER_SPAN)
            .await
    }

    /// Per-article read/share/favourite counts for one day.
    pub async fn article_summary(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getarticlesummary", date, date, 1).await
    }

    /// Lifetime totals for articles published on the given day.
    pub async fn article_total(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getarticletotal", date, date, 1).await
    }

    /// Account-wide article read counts per day.
    pub async fn user_read(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getuserread", begin, end, MAX_READ_SPAN)
            .await
    }

    /// Hourly read breakdown for one day.
    pub async fn user_read_hour(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getuserreadhour", date, date, 1).await
    }

    pub async fn user_share(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getusershare", begin, end, MAX_SHARE_SPAN)
            .await
    }

    pub async fn user_share_hour(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getusersharehour", date, date, 1).await
    }

    /// Messages sent by followers to the account, per day.
    pub async fn upstream_msg(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getupstreammsg", begin, end, MAX_MSG_SPAN)
            .await
    }

    pub async fn upstream_msg_hour(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getupstreammsghour", date, date, 1).await
    }

    /// Weekly rollup of upstream message volume.
    pub async fn upstream_msg_week(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getupstreammsgweek", begin, end, MAX_MSG_ROLLUP_SPAN)
            .await
    }

    /// Monthly rollup of upstream message volume.
    pub async fn upstream_msg_month(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getupstreammsgmonth", begin, end, MAX_MSG_ROLLUP_SPAN)
            .await
    }

    /// Distribution of upstream messages per sender message count.
    pub async fn upstream_msg_dist(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getupstreammsgdist", begin, end, MAX_MSG_DIST_SPAN)
            .await
    }

    /// API call volumes and latencies for the account.
    pub async fn interface_summary(&self, begin: NaiveDate, end: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getinterfacesummary", begin, end, MAX_INTERFACE_SPAN)
            .await
    }

    pub async fn interface_summary_hour(&self, date: NaiveDate) -> Result<Vec<Value>> {
        self.datacube("/datacube/getinterfacesummaryhour", date, date, 1)
            .await
    }

    async fn datacube(
        &self,
        endpoint: &str,
        begin: NaiveDate,
        end: NaiveDate,
        max_span: i64,
    ) -> Result<Vec<Value>> {
        check_span(begin, end, max_span)?;
        let resp: DataList = self
            .client
            .post(
                endpoint,
                &json!({
                    "begin_date": begin.format("%Y-%m-%d").to_string(),
                    "end_date": end.format("%Y-%m-%d").to_string(),
                }),
            )
            .await?;
        Ok(resp.list)
    }
}

/// The datacube endpoints reject reversed or over-long ranges with opaque
/// errors, so the obvious mistakes are caught before any request is sent.
fn check_span(begin: NaiveDate, end: NaiveDate, max_span: i64) -> Result<()> {
    if begin > end {
        return Err(Error::InvalidArgument(
            "begin_date is after end_date".into(),
        ));
    }
    let span = (end - begin).num_days();
    if span > max_span {
        return Err(Error::InvalidArgument(format!(
            "date span of {span} days exceeds the endpoint maximum of {max_span}"
        )));
    }
    Ok(())
}
