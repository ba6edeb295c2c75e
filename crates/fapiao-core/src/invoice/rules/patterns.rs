//! Regex patterns for VAT invoice labels.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // 发票号码: 01234567
    pub static ref INVOICE_NUMBER: Regex = Regex::new(
        r"发票号码[:：]?\s*(\d+)"
    ).unwrap();

    // Party labels, tolerant of a break between 名 and 称
    pub static ref PARTY_NAME: Regex = Regex::new(
        r"名\s*称[:：]+\s*(\S+)"
    ).unwrap();

    pub static ref PARTY_TAX_ID: Regex = Regex::new(
        r"识别号[:：]?\s*(\S+)"
    ).unwrap();

    pub static ref INVOICE_KIND: Regex = Regex::new(
        r"(增值税专用发票|普通发票)"
    ).unwrap();

    // ¥1,234.56 with either yen sign
    pub static ref CURRENCY_AMOUNT: Regex = Regex::new(
        r"[¥￥]+([\d,]+\.\d{2})"
    ).unwrap();

    // (小写) ¥ 1,234.56
    pub static ref LOWERCASE_AMOUNT: Regex = Regex::new(
        r"[(（]+小写[)）]+[:：]?\s*[¥￥]+\s*([\d,]+\.\d{2})"
    ).unwrap();

    pub static ref CONTRACT_NUMBER: Regex = Regex::new(
        r"合同编号[:：]?\s*B\s*S\s*([A-Za-z0-9]+)"
    ).unwrap();
}
