//! Escaping and validation helpers for values spliced into SOQL and URLs.
//!
//! Every caller-supplied value placed inside a SOQL string literal must go
//! through [`soql::escape_string`]:
//!
//! ```rust
//! use busbar_sf_client::security::soql;
//!
//! let name = soql::escape_string("O'Brien");
//! let query = format!("SELECT Id FROM ApexClass WHERE Name = '{}'", name);
//! assert_eq!(query, "SELECT Id FROM ApexClass WHERE Name = 'O\\'Brien'");
//! ```

/// SOQL escaping utilities.
pub mod soql {
    /// Escape a string value for use inside a single-quoted SOQL literal.
    ///
    /// ```rust
    /// use busbar_sf_client::security::soql;
    ///
    /// assert_eq!(soql::escape_string("O'Brien & Co."), "O\\'Brien & Co.");
    /// ```
    #[must_use]
    pub fn escape_string(value: &str) -> String {
        let mut escaped = String::with_capacity(value.len() + 16);
        for ch in value.chars() {
            match ch {
                '\'' => escaped.push_str("\\'"),
                '\\' => escaped.push_str("\\\\"),
                '\n' => escaped.push_str("\\n"),
                '\r' => escaped.push_str("\\r"),
                '\t' => escaped.push_str("\\t"),
                _ => escaped.push(ch),
            }
        }
        escaped
    }

    /// Field and object names: a leading letter, then ASCII alphanumerics and
    /// underscores.
    ///
    /// ```rust
    /// use busbar_sf_client::security::soql;
    ///
    /// assert!(soql::is_safe_field_name("Custom_Field__c"));
    /// assert!(!soql::is_safe_field_name("Bad'; DROP TABLE--"));
    /// ```
    #[must_use]
    pub fn is_safe_field_name(name: &str) -> bool {
        let mut chars = name.chars();
        match chars.next() {
            Some(first) if first.is_ascii_alphabetic() => {
                chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
            }
            _ => false,
        }
    }
}

/// URL encoding utilities.
pub mod url {
    /// Percent-encode a value placed in a URL path segment.
    #[must_use]
    pub fn encode_param(value: &str) -> String {
        urlencoding::encode(value).into_owned()
    }

    /// Salesforce record ids are 15 or 18 ASCII alphanumerics.
    ///
    /// ```rust
    /// use busbar_sf_client::security::url;
    ///
    /// assert!(url::is_valid_salesforce_id("0Af000000000001AAA"));
    /// assert!(!url::is_valid_salesforce_id("0Af/../../etc"));
    /// ```
    #[must_use]
    pub fn is_valid_salesforce_id(id: &str) -> bool {
        let len = id.len();
        (len == 15 || len == 18) && id.chars().all(|c| c.is_ascii_alphanumeric())
    }
}
