//! Yahoo Finance market-data source
//!
//! Fetches fundamentals through the quoteSummary endpoint and price
//! history through the chart endpoint, normalizing both into the payload
//! model. All failure classification happens here: HTTP 404 and Yahoo's
//! "Not Found" payloads become [`MarketError::NotFound`], 429 becomes
//! [`MarketError::RateLimited`], everything else is transient.

use crate::error::{MarketError, Result};
use crate::model::{
    AnalystConsensus, CompanyProfile, FinancialStatement, PriceHistory, PricePoint, QuarterPoint,
    QuarterlySeries,
};
use crate::source::{MarketDataSource, Operation, Timeframe};
use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

const QUOTE_SUMMARY_URL: &str = "https://query2.finance.yahoo.com/v10/finance/quoteSummary";
const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";

// Yahoo rejects requests without a browser-like user agent
const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64; rv:130.0) Gecko/20100101 Firefox/130.0";

/// Yahoo Finance source
pub struct YahooFinanceSource {
    client: Client,
}

impl YahooFinanceSource {
    /// Create a new source with a bounded per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    async fn quote_summary(&self, symbol: &str, modules: &str) -> Result<Value> {
        debug!(symbol, modules, "Fetching quoteSummary");
        let url = format!("{QUOTE_SUMMARY_URL}/{symbol}");
        let response = self
            .client
            .get(url)
            .query(&[("modules", modules)])
            .send()
            .await?;

        let payload = classify_response(symbol, response).await?;
        let result = payload
            .pointer("/quoteSummary/result/0")
            .cloned()
            .ok_or_else(|| not_found_or_transient(symbol, &payload, "/quoteSummary/error"))?;
        Ok(result)
    }

    async fn chart(&self, symbol: &str, timeframe: Timeframe) -> Result<Value> {
        debug!(symbol, timeframe = timeframe.as_str(), "Fetching chart");
        let range = match timeframe {
            Timeframe::M1 => "1mo",
            Timeframe::M3 => "3mo",
            Timeframe::M6 => "6mo",
            Timeframe::Y1 => "1y",
        };
        let url = format!("{CHART_URL}/{symbol}");
        let response = self
            .client
            .get(url)
            .query(&[("range", range), ("interval", "1d")])
            .send()
            .await?;

        let payload = classify_response(symbol, response).await?;
        let result = payload
            .pointer("/chart/result/0")
            .cloned()
            .ok_or_else(|| not_found_or_transient(symbol, &payload, "/chart/error"))?;
        Ok(result)
    }
}

#[async_trait]
impl MarketDataSource for YahooFinanceSource {
    async fn fetch(&self, symbol: &str, operation: Operation) -> Result<Value> {
        let payload = match operation {
            Operation::CompanyProfile => {
                let raw = self
                    .quote_summary(
                        symbol,
                        "assetProfile,price,summaryDetail,defaultKeyStatistics,financialData",
                    )
                    .await?;
                serde_json::to_value(normalize_profile(symbol, &raw))?
            }
            Operation::IncomeStatement
            | Operation::BalanceSheet
            | Operation::CashFlow => {
                let module = annual_module(operation);
                let raw = self.quote_summary(symbol, module).await?;
                serde_json::to_value(normalize_statement(symbol, operation, &raw))?
            }
            Operation::QuarterlyIncome
            | Operation::QuarterlyCashFlow
            | Operation::QuarterlyBalanceSheet => {
                let module = quarterly_module(operation);
                let raw = self.quote_summary(symbol, module).await?;
                serde_json::to_value(normalize_quarterly(symbol, operation, &raw))?
            }
            Operation::AnalystConsensus => {
                let raw = self
                    .quote_summary(symbol, "financialData,recommendationTrend,price")
                    .await?;
                serde_json::to_value(normalize_consensus(symbol, &raw))?
            }
            Operation::PriceHistory(timeframe) => {
                let raw = self.chart(symbol, timeframe).await?;
                serde_json::to_value(normalize_history(symbol, &raw))?
            }
        };
        Ok(payload)
    }

    fn name(&self) -> &'static str {
        "yahoo"
    }
}

async fn classify_response(symbol: &str, response: reqwest::Response) -> Result<Value> {
    let status = response.status();
    if status.as_u16() == 404 {
        return Err(MarketError::NotFound(symbol.to_string()));
    }
    if status.as_u16() == 429 {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketError::RateLimited(format!("HTTP 429: {body}")));
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(MarketError::Transient(format!("HTTP {status}: {body}")));
    }
    Ok(response.json().await?)
}

/// Distinguish a symbol-unknown error payload from a malformed one
fn not_found_or_transient(symbol: &str, payload: &Value, error_pointer: &str) -> MarketError {
    let description = payload
        .pointer(error_pointer)
        .and_then(|e| e.get("description").or_else(|| e.get("code")))
        .and_then(Value::as_str)
        .unwrap_or("empty result");

    if description.to_lowercase().contains("not found") {
        MarketError::NotFound(symbol.to_string())
    } else {
        MarketError::Transient(format!("upstream error for {symbol}: {description}"))
    }
}

fn annual_module(operation: Operation) -> &'static str {
    match operation {
        Operation::IncomeStatement => "incomeStatementHistory",
        Operation::BalanceSheet => "balanceSheetHistory",
        _ => "cashflowStatementHistory",
    }
}

fn quarterly_module(operation: Operation) -> &'static str {
    match operation {
        Operation::QuarterlyIncome => "incomeStatementHistoryQuarterly",
        Operation::QuarterlyBalanceSheet => "balanceSheetHistoryQuarterly",
        _ => "cashflowStatementHistoryQuarterly",
    }
}

fn statement_items<'a>(operation: Operation, raw: &'a Value) -> &'a [Value] {
    let pointer = match operation {
        Operation::IncomeStatement => "/incomeStatementHistory/incomeStatementHistory",
        Operation::BalanceSheet => "/balanceSheetHistory/balanceSheetStatements",
        Operation::CashFlow => "/cashflowStatementHistory/cashflowStatements",
        Operation::QuarterlyIncome => "/incomeStatementHistoryQuarterly/incomeStatementHistory",
        Operation::QuarterlyBalanceSheet => "/balanceSheetHistoryQuarterly/balanceSheetStatements",
        _ => "/cashflowStatementHistoryQuarterly/cashflowStatements",
    };
    raw.pointer(pointer)
        .and_then(Value::as_array)
        .map_or(&[], Vec::as_slice)
}

// Yahoo wraps every numeric field as {"raw": 1.23, "fmt": "1.23"}
fn raw_f64(value: &Value, field: &str) -> Option<f64> {
    let v = value.get(field)?;
    v.get("raw").and_then(Value::as_f64).or_else(|| v.as_f64())
}

fn raw_u32(value: &Value, field: &str) -> Option<u32> {
    let v = value.get(field)?;
    v.get("raw")
        .and_then(Value::as_u64)
        .or_else(|| v.as_u64())
        .map(|n| n as u32)
}

fn fmt_str(value: &Value, field: &str) -> Option<String> {
    let v = value.get(field)?;
    v.get("fmt")
        .and_then(Value::as_str)
        .or_else(|| v.as_str())
        .map(str::to_string)
}

fn plain_str(value: &Value, field: &str) -> Option<String> {
    value.get(field).and_then(Value::as_str).map(str::to_string)
}

fn normalize_profile(symbol: &str, raw: &Value) -> CompanyProfile {
    let price = raw.get("price").cloned().unwrap_or(Value::Null);
    let detail = raw.get("summaryDetail").cloned().unwrap_or(Value::Null);
    let stats = raw
        .get("defaultKeyStatistics")
        .cloned()
        .unwrap_or(Value::Null);
    let financial = raw.get("financialData").cloned().unwrap_or(Value::Null);
    let asset = raw.get("assetProfile").cloned().unwrap_or(Value::Null);

    CompanyProfile {
        symbol: symbol.to_uppercase(),
        name: plain_str(&price, "longName").or_else(|| plain_str(&price, "shortName")),
        currency: plain_str(&price, "currency"),
        exchange: plain_str(&price, "exchangeName"),
        sector: plain_str(&asset, "sector"),
        industry: plain_str(&asset, "industry"),

        current_price: raw_f64(&financial, "currentPrice")
            .or_else(|| raw_f64(&price, "regularMarketPrice")),
        market_cap: raw_f64(&price, "marketCap"),
        enterprise_value: raw_f64(&stats, "enterpriseValue"),
        shares_outstanding: raw_f64(&stats, "sharesOutstanding"),
        fifty_two_week_high: raw_f64(&detail, "fiftyTwoWeekHigh"),
        fifty_two_week_low: raw_f64(&detail, "fiftyTwoWeekLow"),
        beta: raw_f64(&detail, "beta"),
        dividend_yield: raw_f64(&detail, "dividendYield"),

        total_revenue: raw_f64(&financial, "totalRevenue"),
        ebitda: raw_f64(&financial, "ebitda"),
        net_income: raw_f64(&stats, "netIncomeToCommon"),
        eps_trailing: raw_f64(&stats, "trailingEps"),
        eps_forward: raw_f64(&stats, "forwardEps"),

        pe_ratio: raw_f64(&detail, "trailingPE").or_else(|| raw_f64(&stats, "forwardPE")),
        forward_pe: raw_f64(&stats, "forwardPE"),
        pb_ratio: raw_f64(&stats, "priceToBook"),
        ps_ratio: raw_f64(&detail, "priceToSalesTrailing12Months"),
        peg_ratio: raw_f64(&stats, "pegRatio"),

        profit_margin: raw_f64(&financial, "profitMargins"),
        gross_margin: raw_f64(&financial, "grossMargins"),
        operating_margin: raw_f64(&financial, "operatingMargins"),
        return_on_equity: raw_f64(&financial, "returnOnEquity"),
        return_on_assets: raw_f64(&financial, "returnOnAssets"),
    }
}

fn normalize_statement(symbol: &str, operation: Operation, raw: &Value) -> FinancialStatement {
    let mut statement = FinancialStatement {
        symbol: symbol.to_uppercase(),
        ..Default::default()
    };

    let Some(latest) = statement_items(operation, raw).first() else {
        return statement;
    };

    statement.period = fmt_str(latest, "endDate");
    fill_statement_fields(&mut statement, latest);
    statement
}

fn fill_statement_fields(statement: &mut FinancialStatement, item: &Value) {
    statement.revenue = raw_f64(item, "totalRevenue");
    statement.gross_profit = raw_f64(item, "grossProfit");
    statement.operating_income = raw_f64(item, "operatingIncome").or_else(|| raw_f64(item, "ebit"));
    statement.net_income = raw_f64(item, "netIncome");
    statement.ebitda = raw_f64(item, "ebitda");

    statement.total_assets = raw_f64(item, "totalAssets");
    statement.total_debt = total_debt(item);
    statement.total_cash = raw_f64(item, "cash")
        .or_else(|| raw_f64(item, "cashAndCashEquivalents"));
    statement.stockholders_equity = raw_f64(item, "totalStockholderEquity");
    statement.current_assets = raw_f64(item, "totalCurrentAssets");
    statement.current_liabilities = raw_f64(item, "totalCurrentLiabilities");
    statement.inventory = raw_f64(item, "inventory");

    statement.operating_cash_flow = raw_f64(item, "totalCashFromOperatingActivities");
    statement.capital_expenditures = raw_f64(item, "capitalExpenditures");
    statement.free_cash_flow = match (statement.operating_cash_flow, statement.capital_expenditures)
    {
        // Yahoo reports capex as a negative outflow
        (Some(ocf), Some(capex)) => Some(ocf + capex),
        _ => None,
    };
}

fn total_debt(item: &Value) -> Option<f64> {
    let short = raw_f64(item, "shortLongTermDebt");
    let long = raw_f64(item, "longTermDebt");
    match (short, long) {
        (None, None) => None,
        (s, l) => Some(s.unwrap_or(0.0) + l.unwrap_or(0.0)),
    }
}

fn normalize_quarterly(symbol: &str, operation: Operation, raw: &Value) -> QuarterlySeries {
    let quarters = statement_items(operation, raw)
        .iter()
        .map(|item| {
            let mut statement = FinancialStatement::default();
            fill_statement_fields(&mut statement, item);
            QuarterPoint {
                period: fmt_str(item, "endDate").unwrap_or_default(),
                revenue: statement.revenue,
                gross_profit: statement.gross_profit,
                operating_income: statement.operating_income,
                net_income: statement.net_income,
                ebitda: statement.ebitda,
                operating_cash_flow: statement.operating_cash_flow,
                free_cash_flow: statement.free_cash_flow,
                capital_expenditures: statement.capital_expenditures,
                total_assets: statement.total_assets,
                total_debt: statement.total_debt,
                total_cash: statement.total_cash,
                stockholders_equity: statement.stockholders_equity,
                ..Default::default()
            }
        })
        .collect();

    QuarterlySeries {
        symbol: symbol.to_uppercase(),
        quarters,
    }
}

fn normalize_consensus(symbol: &str, raw: &Value) -> AnalystConsensus {
    let financial = raw.get("financialData").cloned().unwrap_or(Value::Null);
    let price = raw.get("price").cloned().unwrap_or(Value::Null);
    // Period "0m" is the current month's distribution
    let trend = raw
        .pointer("/recommendationTrend/trend/0")
        .cloned()
        .unwrap_or(Value::Null);

    AnalystConsensus {
        symbol: symbol.to_uppercase(),
        current_price: raw_f64(&financial, "currentPrice")
            .or_else(|| raw_f64(&price, "regularMarketPrice")),
        mean_target: raw_f64(&financial, "targetMeanPrice"),
        high_target: raw_f64(&financial, "targetHighPrice"),
        low_target: raw_f64(&financial, "targetLowPrice"),
        analyst_count: raw_u32(&financial, "numberOfAnalystOpinions"),
        recommendation_key: plain_str(&financial, "recommendationKey"),
        strong_buy: raw_u32(&trend, "strongBuy"),
        buy: raw_u32(&trend, "buy"),
        hold: raw_u32(&trend, "hold"),
        sell: raw_u32(&trend, "sell"),
        strong_sell: raw_u32(&trend, "strongSell"),
    }
}

fn normalize_history(symbol: &str, raw: &Value) -> PriceHistory {
    let timestamps = raw
        .get("timestamp")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();
    let closes = raw
        .pointer("/indicators/quote/0/close")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let points = timestamps
        .iter()
        .zip(closes.iter())
        .filter_map(|(ts, close)| {
            let close = close.as_f64()?;
            let date = DateTime::from_timestamp(ts.as_i64()?, 0)?
                .format("%Y-%m-%d")
                .to_string();
            Some(PricePoint { date, close })
        })
        .collect();

    PriceHistory {
        symbol: symbol.to_uppercase(),
        points,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_profile() {
        let raw = json!({
            "price": {
                "longName": "Apple Inc.",
                "currency": "USD",
                "exchangeName": "NasdaqGS",
                "regularMarketPrice": {"raw": 185.5, "fmt": "185.50"},
                "marketCap": {"raw": 2.9e12, "fmt": "2.9T"}
            },
            "assetProfile": {"sector": "Technology", "industry": "Consumer Electronics"},
            "summaryDetail": {
                "trailingPE": {"raw": 29.4},
                "beta": {"raw": 1.25},
                "fiftyTwoWeekHigh": {"raw": 199.6}
            },
            "defaultKeyStatistics": {
                "priceToBook": {"raw": 45.2},
                "trailingEps": {"raw": 6.3}
            },
            "financialData": {
                "currentPrice": {"raw": 185.7},
                "totalRevenue": {"raw": 3.8e11},
                "profitMargins": {"raw": 0.25},
                "returnOnEquity": {"raw": 1.47}
            }
        });

        let profile = normalize_profile("aapl", &raw);
        assert_eq!(profile.symbol, "AAPL");
        assert_eq!(profile.name.as_deref(), Some("Apple Inc."));
        assert_eq!(profile.sector.as_deref(), Some("Technology"));
        assert_eq!(profile.current_price, Some(185.7));
        assert_eq!(profile.pe_ratio, Some(29.4));
        assert_eq!(profile.pb_ratio, Some(45.2));
        assert_eq!(profile.profit_margin, Some(0.25));
        assert!(profile.peg_ratio.is_none());
    }

    #[test]
    fn test_normalize_balance_sheet() {
        let raw = json!({
            "balanceSheetHistory": {
                "balanceSheetStatements": [{
                    "endDate": {"raw": 1727654400, "fmt": "2024-09-30"},
                    "totalAssets": {"raw": 3.65e11},
                    "cash": {"raw": 3.0e10},
                    "shortLongTermDebt": {"raw": 1.0e10},
                    "longTermDebt": {"raw": 8.5e10},
                    "totalCurrentAssets": {"raw": 1.5e11},
                    "totalCurrentLiabilities": {"raw": 1.3e11},
                    "totalStockholderEquity": {"raw": 6.2e10}
                }]
            }
        });

        let statement = normalize_statement("AAPL", Operation::BalanceSheet, &raw);
        assert_eq!(statement.period.as_deref(), Some("2024-09-30"));
        assert_eq!(statement.total_assets, Some(3.65e11));
        assert_eq!(statement.total_debt, Some(9.5e10));
        assert_eq!(statement.current_liabilities, Some(1.3e11));
        assert!(statement.revenue.is_none());
    }

    #[test]
    fn test_normalize_quarterly_cash_flow_derives_fcf() {
        let raw = json!({
            "cashflowStatementHistoryQuarterly": {
                "cashflowStatements": [{
                    "endDate": {"fmt": "2025-06-30"},
                    "totalCashFromOperatingActivities": {"raw": 3.0e10},
                    "capitalExpenditures": {"raw": -2.5e9}
                }]
            }
        });

        let series = normalize_quarterly("AAPL", Operation::QuarterlyCashFlow, &raw);
        assert_eq!(series.quarters.len(), 1);
        assert_eq!(series.quarters[0].operating_cash_flow, Some(3.0e10));
        assert_eq!(series.quarters[0].free_cash_flow, Some(2.75e10));
    }

    #[test]
    fn test_normalize_consensus() {
        let raw = json!({
            "financialData": {
                "currentPrice": {"raw": 185.7},
                "targetMeanPrice": {"raw": 210.0},
                "targetHighPrice": {"raw": 250.0},
                "targetLowPrice": {"raw": 160.0},
                "numberOfAnalystOpinions": {"raw": 38},
                "recommendationKey": "buy"
            },
            "recommendationTrend": {
                "trend": [
                    {"period": "0m", "strongBuy": 12, "buy": 20, "hold": 5, "sell": 1, "strongSell": 0}
                ]
            }
        });

        let consensus = normalize_consensus("AAPL", &raw);
        assert_eq!(consensus.mean_target, Some(210.0));
        assert_eq!(consensus.analyst_count, Some(38));
        assert_eq!(consensus.strong_buy, Some(12));
        assert_eq!(consensus.recommendation_key.as_deref(), Some("buy"));
    }

    #[test]
    fn test_normalize_history_skips_null_closes() {
        let raw = json!({
            "timestamp": [1735776000, 1735862400, 1735948800],
            "indicators": {
                "quote": [{"close": [100.0, null, 104.5]}]
            }
        });

        let history = normalize_history("^GSPC", &raw);
        assert_eq!(history.points.len(), 2);
        assert_eq!(history.points[0].close, 100.0);
        assert_eq!(history.performance_percent(), Some(4.5));
    }

    #[test]
    fn test_not_found_payload_classification() {
        let payload = json!({
            "quoteSummary": {
                "result": null,
                "error": {"code": "Not Found", "description": "Quote not found for ticker symbol: ZZZZZZ"}
            }
        });

        let err = not_found_or_transient("ZZZZZZ", &payload, "/quoteSummary/error");
        assert!(matches!(err, MarketError::NotFound(_)));

        let payload = json!({"quoteSummary": {"result": null, "error": null}});
        let err = not_found_or_transient("AAPL", &payload, "/quoteSummary/error");
        assert!(matches!(err, MarketError::Transient(_)));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_fetch_profile_live() {
        let source = YahooFinanceSource::new(Duration::from_secs(10)).unwrap();
        let value = source.fetch("AAPL", Operation::CompanyProfile).await.unwrap();
        let profile: CompanyProfile = serde_json::from_value(value).unwrap();
        assert_eq!(profile.symbol, "AAPL");
        assert!(profile.current_price.is_some());
    }
}
