//! Naming convention utilities.
//!
//! Pure string transforms applied while building the intermediate model and
//! when rendering templates. None of these functions fail; an empty input
//! yields an empty output.
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `user_create` | [`to_upper_camel_case`] | `UserCreate` |
//! | `user_create` | [`to_lower_camel_case`] | `userCreate` |
//! | `user_service.v1` | [`service_or_method_name`] | `UserService` |
//! | `.user.v1.CreateUserRequest` | [`clean_type_name`] | `CreateUserRequest` |
//! | `CreateUserRequest` | [`strip_request_suffix`] | `CreateUser` |
//! | `CreateUserReply` | [`strip_reply_suffix`] | `CreateUser` |

/// Convert snake_case to UpperCamelCase.
///
/// Every `_`-separated segment gets its first character upper-cased; the
/// remaining characters are left as they are, so already-camel input is
/// unchanged.
///
/// # Examples
///
/// ```
/// use protoscaffold_common::naming::to_upper_camel_case;
///
/// assert_eq!(to_upper_camel_case("user_create"), "UserCreate");
/// assert_eq!(to_upper_camel_case("UserCreate"), "UserCreate");
/// assert_eq!(to_upper_camel_case("http_URL"), "HttpURL");
/// ```
pub fn to_upper_camel_case(s: &str) -> String {
    s.split('_')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}

/// Convert snake_case to lowerCamelCase.
///
/// # Examples
///
/// ```
/// use protoscaffold_common::naming::to_lower_camel_case;
///
/// assert_eq!(to_lower_camel_case("user_create"), "userCreate");
/// assert_eq!(to_lower_camel_case("UserCreate"), "userCreate");
/// ```
pub fn to_lower_camel_case(s: &str) -> String {
    let upper = to_upper_camel_case(s);
    let mut chars = upper.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Normalize a service or RPC identifier.
///
/// Anything from the first `.` on is dropped before camel-casing.
pub fn service_or_method_name(name: &str) -> String {
    let head = name.split('.').next().unwrap_or(name);
    to_upper_camel_case(head)
}

/// Reduce a (possibly fully qualified) type reference to its bare identifier.
///
/// # Examples
///
/// ```
/// use protoscaffold_common::naming::clean_type_name;
///
/// assert_eq!(clean_type_name(".a.b.C"), "C");
/// assert_eq!(clean_type_name("C"), "C");
/// ```
pub fn clean_type_name(qualified: &str) -> String {
    let trimmed = qualified.strip_prefix('.').unwrap_or(qualified);
    trimmed
        .rsplit('.')
        .next()
        .unwrap_or(trimmed)
        .to_string()
}

/// Remove one trailing `Request`, if present
pub fn strip_request_suffix(name: &str) -> String {
    name.strip_suffix("Request").unwrap_or(name).to_string()
}

/// Remove one trailing `Reply`, if present
pub fn strip_reply_suffix(name: &str) -> String {
    name.strip_suffix("Reply").unwrap_or(name).to_string()
}

/// Module path part of a `go_package` option value (`"path;alias"` → `path`)
pub fn go_package_path(value: &str) -> String {
    value.split(';').next().unwrap_or(value).trim().to_string()
}

/// Last `/`-separated segment of a package path (`internal/domain` → `domain`)
pub fn package_name(path: &str) -> String {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}
