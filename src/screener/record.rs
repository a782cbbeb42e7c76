use crate::core::conversions::{
    non_empty, parse_currency, parse_date, parse_int, parse_timestamp,
};
use crate::core::{InsiderError, RawRow, TransactionRecord, XFlag};

impl TryFrom<&RawRow> for TransactionRecord {
    type Error = InsiderError;

    fn try_from(row: &RawRow) -> Result<Self, Self::Error> {
        let [
            x,
            filing_date,
            trade_date,
            ticker,
            company_name,
            insider_name,
            title,
            trade_type,
            price,
            qty,
            owned,
            delta_owned,
            value,
        ] = row;

        let trade_date = parse_date("trade_date", trade_date)?
            .ok_or_else(|| InsiderError::parse("trade_date", trade_date, "missing"))?;
        let ticker = non_empty(ticker)
            .ok_or_else(|| InsiderError::parse("ticker", ticker, "missing"))?
            .to_ascii_uppercase();

        Ok(TransactionRecord {
            x_flag: XFlag::parse(x)?,
            filing_date: parse_timestamp("filing_date", filing_date)?,
            trade_date,
            ticker,
            company_name: non_empty(company_name),
            insider_name: non_empty(insider_name),
            insider_title: non_empty(title),
            trade_type: non_empty(trade_type),
            price: parse_currency("price", price)?,
            qty: parse_int("qty", qty)?,
            owned: parse_int("owned", owned)?,
            delta_owned: non_empty(delta_owned),
            value: parse_currency("value", value)?,
        })
    }
}
