use std::borrow::Cow;

use crate::error::LaunchError;

/// Quote a word so a POSIX shell reads it back byte-for-byte
///
/// Words made of safe characters are left alone, everything else is single quoted. A NUL byte
/// can't appear in a shell word at all.
pub fn quote(word: &str) -> Result<Cow<'_, str>, LaunchError> {
    if word.contains('\0') {
        return Err(LaunchError::Quote(word.to_string()));
    }
    if word.is_empty() {
        return Ok(Cow::Borrowed("''"));
    }
    if word.chars().all(is_safe) {
        return Ok(Cow::Borrowed(word));
    }
    Ok(Cow::Owned(format!("'{}'", word.replace('\'', "'\"'\"'"))))
}

/// Quote every word and join with single spaces
pub fn join<I, S>(words: I) -> Result<String, LaunchError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted = words
        .into_iter()
        .map(|word| quote(word.as_ref()).map(Cow::into_owned))
        .collect::<Result<Vec<String>, LaunchError>>()?;
    Ok(quoted.join(" "))
}

fn is_safe(c: char) -> bool {
    c.is_ascii_alphanumeric() || "_@%+=:,./-".contains(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_words_are_bare() {
        assert_eq!(quote("--export=VAR=1,ALL").unwrap(), "--export=VAR=1,ALL");
        assert_eq!(quote("/scratch/job.sh").unwrap(), "/scratch/job.sh");
        assert_eq!(quote("--mem=4G").unwrap(), "--mem=4G");
    }

    #[test]
    fn empty_word() {
        assert_eq!(quote("").unwrap(), "''");
    }

    #[test]
    fn metacharacters_are_single_quoted() {
        assert_eq!(quote("a b").unwrap(), "'a b'");
        assert_eq!(quote("$(rm -rf ~)").unwrap(), "'$(rm -rf ~)'");
        assert_eq!(quote("x;y&&z").unwrap(), "'x;y&&z'");
        assert_eq!(quote("héllo").unwrap(), "'héllo'");
    }

    #[test]
    fn embedded_single_quote() {
        assert_eq!(quote("it's").unwrap(), "'it'\"'\"'s'");
    }

    #[test]
    fn quoted_words_split_back_unchanged() {
        let words = ["plain", "two words", "it's", "", "$HOME", "tab\there", "\"dq\""];
        let line = join(words).unwrap();
        assert_eq!(shlex::split(&line).unwrap(), words);
    }

    #[test]
    fn nul_byte_is_rejected() {
        assert!(matches!(quote("a\0b"), Err(LaunchError::Quote(_))));
    }
}
