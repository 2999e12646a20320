/// Cookie carrying the anti-forgery token.
pub const CSRF_COOKIE: &str = "csrftoken";
/// Hidden form field used when the cookie is absent.
pub const CSRF_FORM_FIELD: &str = "csrfmiddlewaretoken";
/// Request header the results service reads the token from.
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// Value of cookie `name` in a `document.cookie` style string.
pub fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Token from the cookie, else from the hidden form field.
pub fn resolve_token(cookies: &str, form_field: Option<&str>) -> Option<String> {
    cookie_value(cookies, CSRF_COOKIE)
        .or(form_field.filter(|v| !v.is_empty()))
        .map(str::to_owned)
}
