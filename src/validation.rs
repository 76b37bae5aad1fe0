//! Client-side checks applied before a form is submitted

use crate::error::{ClientError, Result};
use regex::Regex;
use std::sync::LazyLock;

// local@label(.label)*.tld with no whitespace and no empty labels
static EMAIL_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(?:\.[^\s@.]+)*\.[A-Za-z]{2,}$").unwrap());
static LETTER_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Za-z]").unwrap());
static DIGIT_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[0-9]").unwrap());

pub const MIN_USERNAME_CHARS: usize = 3;
pub const MAX_USERNAME_CHARS: usize = 50;
pub const MIN_PASSWORD_CHARS: usize = 8;
pub const MIN_TITLE_CHARS: usize = 20;
pub const MAX_TITLE_CHARS: usize = 200;
pub const MIN_ARTICLE_WORDS: usize = 1000;
pub const MIN_CATEGORY_CHARS: usize = 3;
pub const MAX_CATEGORY_CHARS: usize = 100;

fn fail(msg: impl Into<String>) -> Result<()> {
    Err(ClientError::Validation(msg.into()))
}

/// Whitespace-separated word count
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn validate_login(username: &str, password: &str) -> Result<()> {
    if username.is_empty() {
        return fail("Username is required");
    }
    if password.is_empty() {
        return fail("Password is required");
    }
    Ok(())
}

pub fn validate_registration(username: &str, email: &str, password: &str) -> Result<()> {
    let name_len = username.chars().count();
    if name_len < MIN_USERNAME_CHARS {
        return fail(format!("Username must be at least {MIN_USERNAME_CHARS} characters"));
    }
    if name_len > MAX_USERNAME_CHARS {
        return fail(format!("Username must not exceed {MAX_USERNAME_CHARS} characters"));
    }
    if !is_valid_email(email) {
        return fail("Please enter a valid email");
    }
    if password.chars().count() < MIN_PASSWORD_CHARS {
        return fail(format!("Password must be at least {MIN_PASSWORD_CHARS} characters"));
    }
    if !(LETTER_REGEX.is_match(password) && DIGIT_REGEX.is_match(password)) {
        return fail("Password must be alphanumeric");
    }
    Ok(())
}

pub fn validate_blog(title: &str, category: &str, article: &str) -> Result<()> {
    let title_len = title.chars().count();
    if title_len < MIN_TITLE_CHARS {
        return fail(format!("Title must be at least {MIN_TITLE_CHARS} characters"));
    }
    if title_len > MAX_TITLE_CHARS {
        return fail(format!("Title must not exceed {MAX_TITLE_CHARS} characters"));
    }
    if category.is_empty() {
        return fail("Category is required");
    }
    if article.is_empty() {
        return fail("Article is required");
    }
    if count_words(article) < MIN_ARTICLE_WORDS {
        return fail(format!("Article must be at least {MIN_ARTICLE_WORDS} words"));
    }
    Ok(())
}

pub fn validate_category(name: &str) -> Result<()> {
    let len = name.chars().count();
    if len < MIN_CATEGORY_CHARS {
        return fail(format!("Category name must be at least {MIN_CATEGORY_CHARS} characters"));
    }
    if len > MAX_CATEGORY_CHARS {
        return fail(format!("Category name must not exceed {MAX_CATEGORY_CHARS} characters"));
    }
    Ok(())
}

fn is_valid_email(email: &str) -> bool {
    EMAIL_REGEX.is_match(email)
}
