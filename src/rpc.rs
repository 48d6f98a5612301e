pub mod cbr {
    use chrono::NaiveDate;
    use roxmltree::Node;

    use crate::service::rate::{KeyRate, KeyRateSource};

    const DAILY_INFO_PATH: &str = "/DailyInfoWebServ/DailyInfo.asmx";
    const SOAP_CONTENT_TYPE: &str = "application/soap+xml";

    /// Client for the cbr.ru daily info SOAP service.
    pub struct Client {
        http: reqwest::Client,
        base_url: String,
    }

    impl Client {
        pub fn new(base_url: &str) -> Self {
            Self {
                http: reqwest::Client::new(),
                base_url: base_url.trim_end_matches('/').to_string(),
            }
        }
    }

    impl KeyRateSource for Client {
        async fn key_rate(&self, from: NaiveDate, to: NaiveDate) -> Result<Vec<KeyRate>, String> {
            let resp = self
                .http
                .post(format!("{}{DAILY_INFO_PATH}", self.base_url))
                .header("content-type", SOAP_CONTENT_TYPE)
                .body(key_rate_envelope(from, to))
                .send()
                .await
                .map_err(|err| format!("unable to request key rate history: {err}"))?;

            if !resp.status().is_success() {
                return Err(format!(
                    "key rate request failed with status {}",
                    resp.status()
                ));
            }

            let body = resp
                .text()
                .await
                .map_err(|err| format!("unable to read key rate response: {err}"))?;

            parse_key_rates(&body)
        }
    }

    // The endpoint expects exactly this capitalization: lowercase fromDate
    // next to capital ToDate.
    fn key_rate_envelope(from: NaiveDate, to: NaiveDate) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema" xmlns:soap12="http://www.w3.org/2003/05/soap-envelope">"#,
                "<soap12:Body>",
                r#"<KeyRateXML xmlns="http://web.cbr.ru/">"#,
                "<fromDate>{from}</fromDate>",
                "<ToDate>{to}</ToDate>",
                "</KeyRateXML>",
                "</soap12:Body>",
                "</soap12:Envelope>",
            ),
            from = from.format("%Y-%m-%d"),
            to = to.format("%Y-%m-%d"),
        )
    }

    fn parse_key_rates(xml: &str) -> Result<Vec<KeyRate>, String> {
        let doc = roxmltree::Document::parse(xml)
            .map_err(|err| format!("unable to parse key rate response: {err}"))?;

        doc.descendants()
            .filter(|n| {
                n.tag_name().name() == "KR"
                    && n.parent().is_some_and(|p| p.tag_name().name() == "KeyRate")
            })
            .map(|n| key_rate_from_node(&n))
            .collect()
    }

    fn key_rate_from_node(node: &Node) -> Result<KeyRate, String> {
        let date = node_text(node, "DT").ok_or("KR record is missing a DT child")?;
        let date = NaiveDate::parse_from_str(date.get(..10).unwrap_or(date), "%Y-%m-%d")
            .map_err(|err| format!("unable to parse key rate date '{date}': {err}"))?;

        // Rate arrives as decimal text; unreadable text counts as 0.0 instead
        // of failing the whole fetch. Known quirk, pinned by a test.
        let rate = node_text(node, "Rate")
            .and_then(|t| t.parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(KeyRate::new(date, rate))
    }

    fn node_text<'a>(node: &Node<'a, '_>, name: &str) -> Option<&'a str> {
        node.children()
            .find(|c| c.tag_name().name() == name)
            .and_then(|c| c.text())
            .map(str::trim)
    }

}
