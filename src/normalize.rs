use tracing::debug;

/// the sql literal for an empty string.
pub const EMPTY_LITERAL: &str = "''";

// postgresql reserved key words (reserved, and reserved-but-allowed-as-function-or-type).
// kept sorted so lookups can binary search.
const RESERVED_WORDS: &[&str] = &[
    "all",
    "analyse",
    "analyze",
    "and",
    "any",
    "array",
    "as",
    "asc",
    "asymmetric",
    "authorization",
    "binary",
    "both",
    "case",
    "cast",
    "check",
    "collate",
    "collation",
    "column",
    "concurrently",
    "constraint",
    "create",
    "cross",
    "current_catalog",
    "current_date",
    "current_role",
    "current_schema",
    "current_time",
    "current_timestamp",
    "current_user",
    "default",
    "deferrable",
    "desc",
    "distinct",
    "do",
    "else",
    "end",
    "except",
    "false",
    "fetch",
    "for",
    "foreign",
    "freeze",
    "from",
    "full",
    "grant",
    "group",
    "having",
    "ilike",
    "in",
    "initially",
    "inner",
    "intersect",
    "into",
    "is",
    "isnull",
    "join",
    "lateral",
    "leading",
    "left",
    "like",
    "limit",
    "localtime",
    "localtimestamp",
    "natural",
    "not",
    "notnull",
    "null",
    "offset",
    "on",
    "only",
    "or",
    "order",
    "outer",
    "overlaps",
    "placing",
    "primary",
    "references",
    "returning",
    "right",
    "select",
    "session_user",
    "similar",
    "some",
    "symmetric",
    "system_user",
    "table",
    "tablesample",
    "then",
    "to",
    "trailing",
    "true",
    "union",
    "unique",
    "user",
    "using",
    "variadic",
    "verbose",
    "when",
    "where",
    "window",
    "with",
];

pub fn is_reserved_word(word: &str) -> bool {
    RESERVED_WORDS
        .binary_search(&word.to_ascii_lowercase().as_str())
        .is_ok()
}

/// maps a raw header (or file stem) to a column/table identifier.
///
/// every space is removed, and a result that collides with a reserved word
/// (case-insensitively) gets a leading underscore, so `"Order"` becomes `"_Order"`.
/// never fails; use [`check_identifier`] to reject identifiers the server would not accept.
pub fn normalize_identifier(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| *c != ' ').collect();

    if is_reserved_word(&stripped) {
        format!("_{stripped}")
    } else {
        stripped
    }
}

/// rejects identifiers that would have to be quoted to be valid, since generated
/// statements splice them unquoted. letters, digits, `_` and `$` are allowed;
/// the first character must be a letter or `_`.
pub fn check_identifier(identifier: &str) -> Result<(), String> {
    let mut chars = identifier.chars();
    match chars.next() {
        None => return Err("identifier is empty".to_string()),
        Some(first) if !(first.is_alphabetic() || first == '_') => {
            return Err(format!(
                "identifier `{identifier}` must start with a letter or underscore"
            ));
        }
        Some(_) => {}
    }

    if let Some(bad) = chars.find(|c| !(c.is_alphanumeric() || *c == '_' || *c == '$')) {
        return Err(format!(
            "identifier `{identifier}` contains unsupported character {bad:?}"
        ));
    }

    Ok(())
}

/// maps a raw field to a quoted sql string literal.
///
/// empty fields, and fields whose first byte is not printable, become `''`.
/// everything else has each `'` doubled and is wrapped in single quotes.
pub fn normalize_value(field: &str) -> String {
    match field.as_bytes().first() {
        None => EMPTY_LITERAL.to_string(),
        Some(&lead) if !is_printable_lead_byte(lead) => {
            debug!(lead = %format!("{lead:#04x}"), "non-printable leading byte, storing empty string");
            EMPTY_LITERAL.to_string()
        }
        Some(_) => format!("'{}'", field.replace('\'', "''")),
    }
}

// the byte is judged as the latin-1 character it would be on its own: ascii
// graphic characters and space, plus the printable upper half (0xa1..=0xff).
// multi-byte utf-8 lead bytes land in that upper half, so non-ascii text is kept.
fn is_printable_lead_byte(byte: u8) -> bool {
    matches!(byte, 0x20..=0x7e | 0xa1..=0xff)
}
