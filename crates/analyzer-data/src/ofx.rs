//! OFX statement parsing and writing.
//!
//! Handles both OFX 1.x (SGML: colon-separated header lines, leaf elements
//! without closing tags) and OFX 2.x (XML).  The markup is first tokenised
//! into a small element tree, then the statement aggregates are read out of
//! it into [`Statement`] values.

use std::collections::HashMap;
use std::path::Path;

use analyzer_core::data_processors::{AmountProcessor, OfxDateProcessor, TextProcessor};
use analyzer_core::error::{AnalyzerError, Result};
use analyzer_core::models::{
    DatePeriod, ReferenceBalance, Statement, StatementHeader, Transaction, TransactionKind,
};
use tracing::{debug, warn};

/// Statement aggregates for bank and credit-card accounts.
const STATEMENT_TAGS: &[&str] = &["STMTRS", "CCSTMTRS"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Parse every statement section of one export file.
///
/// `path` is only used to name the file in errors.  Statements and their
/// transactions come back in file order.
pub fn parse_export(path: &Path, contents: &str) -> Result<Vec<Statement>> {
    let malformed = |reason: &str| AnalyzerError::MalformedStatement {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let start = contents
        .to_ascii_uppercase()
        .find("<OFX>")
        .ok_or_else(|| malformed("no <OFX> root element"))?;

    let tree = build_tree(tokenize(&contents[start..]));
    let ofx = tree
        .find("OFX")
        .ok_or_else(|| malformed("no <OFX> root element"))?;

    let institution = ofx
        .find("FI")
        .and_then(|fi| fi.value_of("ORG"))
        .map(str::to_string);

    let mut sections = Vec::new();
    ofx.collect(STATEMENT_TAGS, &mut sections);
    if sections.is_empty() {
        return Err(malformed("no bank or credit card statement found"));
    }

    let mut block = 0;
    let mut statements = Vec::with_capacity(sections.len());
    for section in sections {
        let header = read_header(path, section, institution.clone())?;
        let transactions = read_transactions(path, section, &mut block)?;
        debug!(
            "{}: account {} with {} transactions",
            path.display(),
            header.account_id,
            transactions.len()
        );
        statements.push(Statement {
            header,
            transactions,
        });
    }
    Ok(statements)
}

/// Serialize one statement as an OFX 1.x SGML document.
pub fn write_statement(statement: &Statement) -> String {
    write_export(std::slice::from_ref(statement))
}

/// Serialize statements as one OFX 1.x SGML document.
///
/// The document carries a single sign-on block, so only the first
/// statement's institution is written.
pub fn write_export(statements: &[Statement]) -> String {
    let mut out = String::from(
        "OFXHEADER:100\nDATA:OFXSGML\nVERSION:102\nSECURITY:NONE\nENCODING:USASCII\n\
         CHARSET:1252\nCOMPRESSION:NONE\nOLDFILEUID:NONE\nNEWFILEUID:NONE\n\n<OFX>\n",
    );

    if let Some(org) = statements
        .first()
        .and_then(|s| s.header.institution.as_deref())
    {
        out.push_str("<SIGNONMSGSRSV1>\n<SONRS>\n<STATUS>\n<CODE>0\n<SEVERITY>INFO\n</STATUS>\n");
        out.push_str("<LANGUAGE>ENG\n<FI>\n");
        push_leaf(&mut out, "ORG", org);
        out.push_str("</FI>\n</SONRS>\n</SIGNONMSGSRSV1>\n");
    }

    out.push_str("<BANKMSGSRSV1>\n");
    for (i, statement) in statements.iter().enumerate() {
        let header = &statement.header;
        out.push_str("<STMTTRNRS>\n");
        push_leaf(&mut out, "TRNUID", &(i + 1).to_string());
        out.push_str("<STMTRS>\n");
        if let Some(currency) = header.currency.as_deref() {
            push_leaf(&mut out, "CURDEF", currency);
        }
        out.push_str("<BANKACCTFROM>\n");
        push_leaf(&mut out, "ACCTID", &header.account_id);
        out.push_str("</BANKACCTFROM>\n<BANKTRANLIST>\n");
        if let Some(period) = header.period {
            push_leaf(&mut out, "DTSTART", &OfxDateProcessor::format(period.start));
            push_leaf(&mut out, "DTEND", &OfxDateProcessor::format(period.end));
        }
        for tx in &statement.transactions {
            out.push_str("<STMTTRN>\n");
            push_leaf(&mut out, "TRNTYPE", tx.kind.as_ofx());
            push_leaf(&mut out, "DTPOSTED", &OfxDateProcessor::format(tx.date));
            push_leaf(&mut out, "TRNAMT", &AmountProcessor::format(tx.amount));
            push_leaf(&mut out, "FITID", &tx.id);
            if !tx.description.is_empty() {
                push_leaf(&mut out, "MEMO", &tx.description);
            }
            if let Some(balance) = tx.balance_after {
                push_leaf(&mut out, "BALAMT", &AmountProcessor::format(balance));
            }
            out.push_str("</STMTTRN>\n");
        }
        out.push_str("</BANKTRANLIST>\n");
        if let Some(reference) = header.reference_balance {
            out.push_str("<LEDGERBAL>\n");
            push_leaf(&mut out, "BALAMT", &AmountProcessor::format(reference.amount));
            push_leaf(&mut out, "DTASOF", &OfxDateProcessor::format(reference.date));
            out.push_str("</LEDGERBAL>\n");
        }
        out.push_str("</STMTRS>\n</STMTTRNRS>\n");
    }
    out.push_str("</BANKMSGSRSV1>\n</OFX>\n");
    out
}

fn push_leaf(out: &mut String, tag: &str, value: &str) {
    out.push('<');
    out.push_str(tag);
    out.push('>');
    out.push_str(&TextProcessor::encode_entities(value));
    out.push('\n');
}

// ── Statement extraction ──────────────────────────────────────────────────────

fn read_header(
    path: &Path,
    section: &Element,
    institution: Option<String>,
) -> Result<StatementHeader> {
    let account_id = section
        .child("BANKACCTFROM")
        .or_else(|| section.child("CCACCTFROM"))
        .and_then(|acct| acct.value_of("ACCTID"))
        .ok_or_else(|| AnalyzerError::MalformedStatement {
            path: path.to_path_buf(),
            reason: format!("{} without an ACCTID", section.name),
        })?;

    let period = section.find("BANKTRANLIST").and_then(|list| {
        let start = list.value_of("DTSTART").and_then(OfxDateProcessor::parse);
        let end = list.value_of("DTEND").and_then(OfxDateProcessor::parse);
        match (start, end) {
            (Some(start), Some(end)) => Some(DatePeriod::new(start, end)),
            _ => None,
        }
    });

    let reference_balance = ["LEDGERBAL", "AVAILBAL"]
        .iter()
        .filter_map(|tag| section.child(tag))
        .find_map(|bal| {
            let amount = bal.value_of("BALAMT").and_then(AmountProcessor::parse)?;
            let date = bal.value_of("DTASOF").and_then(OfxDateProcessor::parse)?;
            Some(ReferenceBalance { date, amount })
        });

    Ok(StatementHeader {
        institution,
        account_id: account_id.to_string(),
        currency: section.value_of("CURDEF").map(str::to_uppercase),
        period,
        reference_balance,
    })
}

fn read_transactions(
    path: &Path,
    section: &Element,
    block: &mut usize,
) -> Result<Vec<Transaction>> {
    let mut blocks = Vec::new();
    section.collect(&["STMTTRN"], &mut blocks);

    let mut seen: HashMap<String, usize> = HashMap::new();
    let mut transactions: Vec<Transaction> = Vec::with_capacity(blocks.len());
    for element in blocks {
        *block += 1;
        let tx = read_transaction(path, element, *block)?;
        match seen.get(&tx.id) {
            Some(&idx) if transactions[idx] == tx => {
                debug!(
                    "{}: dropping repeated transaction {} (block {})",
                    path.display(),
                    tx.id,
                    block
                );
            }
            Some(_) => {
                return Err(AnalyzerError::MalformedRecord {
                    path: path.to_path_buf(),
                    block: *block,
                    reason: format!("FITID {} reused with different values", tx.id),
                });
            }
            None => {
                seen.insert(tx.id.clone(), transactions.len());
                transactions.push(tx);
            }
        }
    }
    Ok(transactions)
}

fn read_transaction(path: &Path, element: &Element, block: usize) -> Result<Transaction> {
    let malformed = |reason: String| AnalyzerError::MalformedRecord {
        path: path.to_path_buf(),
        block,
        reason,
    };
    let required = |tag: &str| {
        element
            .value_of(tag)
            .ok_or_else(|| malformed(format!("missing {}", tag)))
    };

    let raw_date = element
        .value_of("DTPOSTED")
        .or_else(|| element.value_of("DTUSER"))
        .ok_or_else(|| malformed("missing DTPOSTED".to_string()))?;
    let date = OfxDateProcessor::parse(raw_date)
        .ok_or_else(|| malformed(format!("unparsable date \"{}\"", raw_date)))?;

    let raw_amount = required("TRNAMT")?;
    let amount = AmountProcessor::parse(raw_amount)
        .ok_or_else(|| malformed(format!("unparsable TRNAMT \"{}\"", raw_amount)))?;

    let id = required("FITID")?.to_string();

    let balance_after = element.value_of("BALAMT").and_then(|raw| {
        let parsed = AmountProcessor::parse(raw);
        if parsed.is_none() {
            warn!(
                "{}: ignoring unparsable BALAMT \"{}\" in block {}",
                path.display(),
                raw,
                block
            );
        }
        parsed
    });

    let description = element
        .value_of("MEMO")
        .or_else(|| element.value_of("NAME"))
        .unwrap_or_default()
        .to_string();

    let kind = element
        .value_of("TRNTYPE")
        .map(TransactionKind::from_ofx)
        .unwrap_or_default();

    Ok(Transaction {
        id,
        date,
        amount,
        balance_after,
        description,
        kind,
    })
}

// ── Markup tree ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token<'a> {
    Open(String),
    Close(String),
    Text(&'a str),
}

/// An aggregate (children) or a leaf (value).
#[derive(Debug, Default)]
struct Element {
    name: String,
    value: Option<String>,
    children: Vec<Element>,
}

impl Element {
    fn named(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Trimmed value of a direct leaf child; empty values count as absent.
    fn value_of(&self, name: &str) -> Option<&str> {
        self.children
            .iter()
            .filter(|c| c.name == name)
            .filter_map(|c| c.value.as_deref())
            .map(str::trim)
            .find(|v| !v.is_empty())
    }

    /// First descendant named `name`, depth-first.
    fn find(&self, name: &str) -> Option<&Element> {
        self.children
            .iter()
            .find_map(|c| if c.name == name { Some(c) } else { c.find(name) })
    }

    /// Every descendant whose name is in `names`, in document order, without
    /// descending into matches.
    fn collect<'a>(&'a self, names: &[&str], out: &mut Vec<&'a Element>) {
        for child in &self.children {
            if names.contains(&child.name.as_str()) {
                out.push(child);
            } else {
                child.collect(names, out);
            }
        }
    }
}

fn tokenize(input: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut rest = input;
    while let Some(lt) = rest.find('<') {
        let text = rest[..lt].trim();
        if !text.is_empty() {
            tokens.push(Token::Text(text));
        }
        let tail = &rest[lt..];

        if tail.starts_with("<!--") {
            rest = match tail.find("-->") {
                Some(end) => &tail[end + 3..],
                None => "",
            };
            continue;
        }

        let Some(gt) = tail.find('>') else {
            rest = "";
            break;
        };
        let inner = tail[1..gt].trim();
        rest = &tail[gt + 1..];

        if inner.starts_with('?') || inner.starts_with('!') || inner.is_empty() {
            continue;
        }
        if let Some(name) = inner.strip_prefix('/') {
            tokens.push(Token::Close(name.trim().to_ascii_uppercase()));
            continue;
        }

        let self_closing = inner.ends_with('/');
        let inner = inner.trim_end_matches('/');
        let name = inner
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .to_ascii_uppercase();
        tokens.push(Token::Open(name.clone()));
        if self_closing {
            tokens.push(Token::Close(name));
        }
    }
    let text = rest.trim();
    if !text.is_empty() {
        tokens.push(Token::Text(text));
    }
    tokens
}

/// Build the element tree under a nameless root.
///
/// An open tag directly followed by text is a leaf; its closing tag is
/// optional.  An open tag that is never closed and holds no text is read
/// as an empty leaf, and whatever got nested under it moves back up to its
/// parent.
fn build_tree(tokens: Vec<Token<'_>>) -> Element {
    let mut stack: Vec<Element> = vec![Element::default()];
    let mut iter = tokens.into_iter().peekable();

    while let Some(token) = iter.next() {
        match token {
            Token::Open(name) => match iter.peek() {
                Some(Token::Text(_)) => {
                    let value = match iter.next() {
                        Some(Token::Text(text)) => TextProcessor::decode_entities(text),
                        _ => String::new(),
                    };
                    if matches!(iter.peek(), Some(Token::Close(close)) if *close == name) {
                        iter.next();
                    }
                    attach(&mut stack, leaf(name, value));
                }
                Some(Token::Close(close)) if *close == name => {
                    iter.next();
                    attach(&mut stack, leaf(name, String::new()));
                }
                _ => stack.push(Element::named(name)),
            },
            Token::Close(name) => {
                let open_at = stack
                    .iter()
                    .skip(1)
                    .rposition(|e| e.name == name && e.value.is_none())
                    .map(|pos| pos + 1);
                if let Some(open_at) = open_at {
                    while stack.len() > open_at + 1 {
                        close_top(&mut stack, false);
                    }
                    close_top(&mut stack, true);
                }
            }
            Token::Text(text) => {
                debug!("ignoring stray text \"{}\"", text);
            }
        }
    }

    while stack.len() > 1 {
        close_top(&mut stack, true);
    }
    stack.pop().unwrap_or_default()
}

fn leaf(name: String, value: String) -> Element {
    Element {
        name,
        value: Some(value),
        children: Vec::new(),
    }
}

fn attach(stack: &mut [Element], element: Element) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(element);
    }
}

fn close_top(stack: &mut Vec<Element>, explicit: bool) {
    if stack.len() <= 1 {
        return;
    }
    let Some(mut element) = stack.pop() else {
        return;
    };
    if explicit {
        attach(stack, element);
        return;
    }
    let orphans = std::mem::take(&mut element.children);
    element.value = Some(String::new());
    attach(stack, element);
    for orphan in orphans {
        attach(stack, orphan);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const SGML_EXPORT: &str = "OFXHEADER:100
DATA:OFXSGML
VERSION:102
SECURITY:NONE
ENCODING:USASCII
CHARSET:1252

<OFX>
<SIGNONMSGSRSV1>
<SONRS>
<STATUS><CODE>0<SEVERITY>INFO</STATUS>
<DTSERVER>20240201120000
<LANGUAGE>FRA
<FI><ORG>Banque Exemple<FID>12345</FI>
</SONRS>
</SIGNONMSGSRSV1>
<BANKMSGSRSV1>
<STMTTRNRS>
<TRNUID>1
<STMTRS>
<CURDEF>EUR
<BANKACCTFROM>
<BANKID>30003
<ACCTID>123
<ACCTTYPE>CHECKING
</BANKACCTFROM>
<BANKTRANLIST>
<DTSTART>20240101
<DTEND>20240131
<STMTTRN>
<TRNTYPE>DEBIT
<DTPOSTED>20240101
<TRNAMT>-50.00
<FITID>t1
<NAME>GROCERY
</STMTTRN>
<STMTTRN>
<FITID>  t2
<MEMO>  Salary &amp; bonus
<TRNAMT>20.00
<DTPOSTED>20240103120000[+1:CET]
<TRNTYPE>CREDIT
<NAME>EMPLOYER
</STMTTRN>
</BANKTRANLIST>
<LEDGERBAL><BALAMT>970.00<DTASOF>20240131</LEDGERBAL>
</STMTRS>
</STMTTRNRS>
</BANKMSGSRSV1>
</OFX>
";

    const XML_EXPORT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="no"?>
<?OFX OFXHEADER="200" VERSION="211" SECURITY="NONE" OLDFILEUID="NONE" NEWFILEUID="NONE"?>
<OFX>
  <!-- credit card export -->
  <CREDITCARDMSGSRSV1>
    <CCSTMTTRNRS>
      <CCSTMTRS>
        <CURDEF>usd</CURDEF>
        <CCACCTFROM><ACCTID>4111-XXXX</ACCTID></CCACCTFROM>
        <BANKTRANLIST>
          <DTSTART>20240301</DTSTART>
          <DTEND>20240331</DTEND>
          <STMTTRN>
            <TRNTYPE>DEBIT</TRNTYPE>
            <DTPOSTED>20240305</DTPOSTED>
            <TRNAMT>-12.34</TRNAMT>
            <FITID>cc-1</FITID>
            <NAME>Coffee</NAME>
            <MEMO></MEMO>
            <BALAMT>-112.34</BALAMT>
          </STMTTRN>
        </BANKTRANLIST>
        <AVAILBAL><BALAMT>-112.34</BALAMT><DTASOF>20240331</DTASOF></AVAILBAL>
      </CCSTMTRS>
    </CCSTMTTRNRS>
  </CREDITCARDMSGSRSV1>
</OFX>
"#;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn parse(contents: &str) -> Result<Vec<Statement>> {
        parse_export(Path::new("test.ofx"), contents)
    }

    fn sgml_with_block(block: &str) -> String {
        format!(
            "OFXHEADER:100\n<OFX><BANKMSGSRSV1><STMTTRNRS><STMTRS><CURDEF>EUR\n\
             <BANKACCTFROM><ACCTID>9</BANKACCTFROM><BANKTRANLIST>\n\
             <STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20240101<TRNAMT>1.00<FITID>ok</STMTTRN>\n\
             {}\n</BANKTRANLIST></STMTRS></STMTTRNRS></BANKMSGSRSV1></OFX>",
            block
        )
    }

    // ── SGML ──────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_sgml_header() {
        let statements = parse(SGML_EXPORT).unwrap();
        assert_eq!(statements.len(), 1);
        let header = &statements[0].header;
        assert_eq!(header.account_id, "123");
        assert_eq!(header.institution.as_deref(), Some("Banque Exemple"));
        assert_eq!(header.currency.as_deref(), Some("EUR"));
        assert_eq!(
            header.period,
            Some(DatePeriod::new(date(2024, 1, 1), date(2024, 1, 31)))
        );
        assert_eq!(
            header.reference_balance,
            Some(ReferenceBalance {
                date: date(2024, 1, 31),
                amount: dec!(970.00),
            })
        );
    }

    #[test]
    fn test_parse_sgml_transactions_in_file_order() {
        let statements = parse(SGML_EXPORT).unwrap();
        let txs = &statements[0].transactions;
        assert_eq!(txs.len(), 2);

        assert_eq!(txs[0].id, "t1");
        assert_eq!(txs[0].date, date(2024, 1, 1));
        assert_eq!(txs[0].amount, dec!(-50.00));
        assert_eq!(txs[0].description, "GROCERY");
        assert_eq!(txs[0].kind, TransactionKind::Debit);
        assert!(txs[0].balance_after.is_none());
    }

    #[test]
    fn test_parse_fields_in_any_order_with_whitespace() {
        let statements = parse(SGML_EXPORT).unwrap();
        let t2 = &statements[0].transactions[1];
        assert_eq!(t2.id, "t2");
        assert_eq!(t2.date, date(2024, 1, 3));
        assert_eq!(t2.amount, dec!(20.00));
        assert_eq!(t2.description, "Salary & bonus");
        assert_eq!(t2.kind, TransactionKind::Credit);
    }

    // ── XML ───────────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_xml_credit_card() {
        let statements = parse(XML_EXPORT).unwrap();
        assert_eq!(statements.len(), 1);
        let statement = &statements[0];
        assert_eq!(statement.header.account_id, "4111-XXXX");
        assert_eq!(statement.header.currency.as_deref(), Some("USD"));
        assert!(statement.header.institution.is_none());
        assert_eq!(
            statement.header.reference_balance.map(|b| b.amount),
            Some(dec!(-112.34))
        );

        let tx = &statement.transactions[0];
        assert_eq!(tx.id, "cc-1");
        assert_eq!(tx.amount, dec!(-12.34));
        assert_eq!(tx.balance_after, Some(dec!(-112.34)));
        // Empty MEMO falls back to NAME.
        assert_eq!(tx.description, "Coffee");
    }

    #[test]
    fn test_parse_lowercase_tags() {
        let contents = "<ofx><stmtrs><bankacctfrom><acctid>55</bankacctfrom>\
                        <banktranlist><stmttrn><dtposted>20240101<trnamt>3<fitid>x</stmttrn>\
                        </banktranlist></stmtrs></ofx>";
        let statements = parse(contents).unwrap();
        assert_eq!(statements[0].header.account_id, "55");
        assert_eq!(statements[0].transactions[0].amount, dec!(3));
    }

    #[test]
    fn test_parse_multiple_statements() {
        let contents = "<OFX><BANKMSGSRSV1>\
            <STMTTRNRS><STMTRS><BANKACCTFROM><ACCTID>A</BANKACCTFROM><BANKTRANLIST>\
            <STMTTRN><DTPOSTED>20240101<TRNAMT>1<FITID>a1</STMTTRN></BANKTRANLIST></STMTRS></STMTTRNRS>\
            <STMTTRNRS><STMTRS><BANKACCTFROM><ACCTID>B</BANKACCTFROM><BANKTRANLIST>\
            <STMTTRN><DTPOSTED>20240102<TRNAMT>2<FITID>b1</STMTTRN></BANKTRANLIST></STMTRS></STMTTRNRS>\
            </BANKMSGSRSV1></OFX>";
        let statements = parse(contents).unwrap();
        let ids: Vec<&str> = statements
            .iter()
            .map(|s| s.header.account_id.as_str())
            .collect();
        assert_eq!(ids, vec!["A", "B"]);
        assert_eq!(statements[1].transactions[0].id, "b1");
    }

    #[test]
    fn test_unclosed_empty_leaf_does_not_swallow_siblings() {
        let contents = sgml_with_block(
            "<STMTTRN><MEMO><TRNTYPE>DEBIT<DTPOSTED>20240102<TRNAMT>-2.00<FITID>empty-memo</STMTTRN>",
        );
        let statements = parse(&contents).unwrap();
        let tx = &statements[0].transactions[1];
        assert_eq!(tx.id, "empty-memo");
        assert_eq!(tx.amount, dec!(-2.00));
        assert_eq!(tx.description, "");
    }

    // ── Failures ──────────────────────────────────────────────────────────────

    #[test]
    fn test_missing_root_is_malformed_statement() {
        let err = parse("date,amount\n2024-01-01,5\n").unwrap_err();
        assert!(matches!(err, AnalyzerError::MalformedStatement { .. }));
    }

    #[test]
    fn test_missing_statement_is_malformed_statement() {
        let err = parse("<OFX><SIGNONMSGSRSV1></SIGNONMSGSRSV1></OFX>").unwrap_err();
        assert!(matches!(err, AnalyzerError::MalformedStatement { .. }));
    }

    #[test]
    fn test_missing_account_id_is_malformed_statement() {
        let err = parse("<OFX><STMTRS><BANKTRANLIST></BANKTRANLIST></STMTRS></OFX>").unwrap_err();
        match err {
            AnalyzerError::MalformedStatement { reason, .. } => assert!(reason.contains("ACCTID")),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_amount_names_block() {
        let contents =
            sgml_with_block("<STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20240102<FITID>no-amount</STMTTRN>");
        match parse(&contents).unwrap_err() {
            AnalyzerError::MalformedRecord { path, block, reason } => {
                assert_eq!(path, Path::new("test.ofx"));
                assert_eq!(block, 2);
                assert_eq!(reason, "missing TRNAMT");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_id_is_malformed() {
        let contents = sgml_with_block("<STMTTRN><DTPOSTED>20240102<TRNAMT>1</STMTTRN>");
        assert!(matches!(
            parse(&contents).unwrap_err(),
            AnalyzerError::MalformedRecord { block: 2, .. }
        ));
    }

    #[test]
    fn test_unparsable_date_is_malformed() {
        let contents =
            sgml_with_block("<STMTTRN><DTPOSTED>01/02/2024<TRNAMT>1<FITID>bad-date</STMTTRN>");
        match parse(&contents).unwrap_err() {
            AnalyzerError::MalformedRecord { reason, .. } => {
                assert!(reason.contains("01/02/2024"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unparsable_amount_is_malformed() {
        let contents =
            sgml_with_block("<STMTTRN><DTPOSTED>20240102<TRNAMT>1,000.00<FITID>grouped</STMTTRN>");
        assert!(matches!(
            parse(&contents).unwrap_err(),
            AnalyzerError::MalformedRecord { .. }
        ));
    }

    #[test]
    fn test_unparsable_balance_after_is_ignored() {
        let contents = sgml_with_block(
            "<STMTTRN><DTPOSTED>20240102<TRNAMT>1<FITID>b<BALAMT>n/a</STMTTRN>",
        );
        let statements = parse(&contents).unwrap();
        assert!(statements[0].transactions[1].balance_after.is_none());
    }

    // ── Duplicate ids within one file ─────────────────────────────────────────

    #[test]
    fn test_exact_duplicate_in_file_is_dropped() {
        let contents =
            sgml_with_block("<STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20240101<TRNAMT>1.00<FITID>ok</STMTTRN>");
        let statements = parse(&contents).unwrap();
        assert_eq!(statements[0].transactions.len(), 1);
    }

    #[test]
    fn test_conflicting_duplicate_in_file_is_malformed() {
        let contents =
            sgml_with_block("<STMTTRN><TRNTYPE>DEBIT<DTPOSTED>20240101<TRNAMT>9.99<FITID>ok</STMTTRN>");
        match parse(&contents).unwrap_err() {
            AnalyzerError::MalformedRecord { block, reason, .. } => {
                assert_eq!(block, 2);
                assert!(reason.contains("ok"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    // ── Writer ────────────────────────────────────────────────────────────────

    #[test]
    fn test_write_then_parse_preserves_normalized_model() {
        let original = parse(SGML_EXPORT).unwrap();
        let written = write_export(&original);
        let reparsed = parse(&written).unwrap();
        assert_eq!(reparsed, original);
    }

    #[test]
    fn test_write_then_parse_xml_statement() {
        let original = parse(XML_EXPORT).unwrap();
        let reparsed = parse(&write_statement(&original[0])).unwrap();
        assert_eq!(reparsed[0].transactions, original[0].transactions);
        assert_eq!(reparsed[0].header, original[0].header);
    }

    #[test]
    fn test_write_escapes_markup_in_text() {
        let statement = Statement {
            header: StatementHeader::new("1"),
            transactions: vec![Transaction {
                id: "x".to_string(),
                date: date(2024, 1, 1),
                amount: dec!(1),
                balance_after: None,
                description: "<b>Tom & Jerry</b>".to_string(),
                kind: TransactionKind::Pos,
            }],
        };
        let written = write_statement(&statement);
        assert!(written.contains("<MEMO>&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;"));
        assert_eq!(parse(&written).unwrap()[0], statement);
    }

    // ── Tokenizer ─────────────────────────────────────────────────────────────

    #[test]
    fn test_tokenize_skips_comments_and_instructions() {
        let tokens = tokenize("<?xml?><!-- <NOT> --><A>  1 </A><B/>");
        assert_eq!(
            tokens,
            vec![
                Token::Open("A".to_string()),
                Token::Text("1"),
                Token::Close("A".to_string()),
                Token::Open("B".to_string()),
                Token::Close("B".to_string()),
            ]
        );
    }
}
