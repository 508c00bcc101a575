//! Property-based tests for repository specification parsing.
//!
//! These tests use proptest to generate specification strings and verify
//! that the parser's invariants hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::repository::{parse, Delimiter};
    use proptest::prelude::*;
    use std::path::Path;

    /// A path segment: no separators, no `@`, never empty.
    fn segment() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-][a-zA-Z0-9_.-]{0,11}"
            .prop_filter("segment must not end in .git", |s| !s.ends_with(".git"))
    }

    fn host() -> impl Strategy<Value = String> {
        "[a-z0-9-]{1,12}(\\.[a-z]{2,5}){0,2}"
    }

    fn branch() -> impl Strategy<Value = String> {
        "[a-zA-Z0-9_-]{1,8}(/[a-zA-Z0-9_-]{1,8}){0,2}"
    }

    // ============================================================================
    // SSH shape
    // ============================================================================

    proptest! {
        /// Property: user@host:path@branch dest decomposes into exactly its parts
        #[test]
        fn ssh_shape_decomposes(
            user in "[a-z][a-z0-9]{0,7}",
            host in host(),
            org in segment(),
            name in segment(),
            branch in branch(),
            dest in segment(),
        ) {
            let path = format!("{}/{}", org, name);
            let input = format!("{}@{}:{}@{} {}", user, host, path, branch, dest);
            let job = parse(&input).unwrap();
            let base = format!("{}@{}", user, host);
            prop_assert_eq!(job.base_url(), base.as_str());
            prop_assert_eq!(job.delimiter(), Delimiter::Colon);
            prop_assert_eq!(job.remote_src(), path.as_str());
            prop_assert_eq!(job.branch(), Some(branch.as_str()));
            prop_assert_eq!(job.dest(), Path::new(&dest));
        }
    }

    // ============================================================================
    // Normal shape
    // ============================================================================

    proptest! {
        /// Property: without a destination, dest is the last segment minus `.git`
        #[test]
        fn normal_shape_derives_dest(
            host in host(),
            org in segment(),
            name in segment(),
            with_git in any::<bool>(),
        ) {
            let suffix = if with_git { ".git" } else { "" };
            let input = format!("https://{}/{}/{}{}", host, org, name, suffix);
            let job = parse(&input).unwrap();
            prop_assert_eq!(job.dest(), Path::new(&name));
        }

        /// Property: full_url is always base_url + delimiter + remote_src
        #[test]
        fn full_url_is_concatenation(
            host in host(),
            org in segment(),
            name in segment(),
            ssh in any::<bool>(),
        ) {
            let input = if ssh {
                format!("git@{}:{}/{}.git", host, org, name)
            } else {
                format!("https://{}/{}/{}.git", host, org, name)
            };
            let job = parse(&input).unwrap();
            let rebuilt = format!("{}{}{}", job.base_url(), job.delimiter(), job.remote_src());
            prop_assert_eq!(job.full_url(), rebuilt.as_str());
            prop_assert_eq!(job.full_url(), input.as_str());
        }

        /// Property: parsing the same input twice yields equal records
        #[test]
        fn parse_is_deterministic(input in ".*") {
            match (parse(&input), parse(&input)) {
                (Ok(a), Ok(b)) => prop_assert_eq!(a, b),
                (Err(_), Err(_)) => {}
                _ => prop_assert!(false, "parse of '{}' was not deterministic", input),
            }
        }

        /// Property: a doubled separator in the path or the destination always fails
        #[test]
        fn double_separator_always_fails(
            host in host(),
            org in segment(),
            name in segment(),
            in_dest in any::<bool>(),
        ) {
            let input = if in_dest {
                format!("https://{}/{}/{} {}//{}", host, org, name, org, name)
            } else {
                format!("https://{}/{}//{}", host, org, name)
            };
            prop_assert!(parse(&input).is_err());
        }

        /// Property: successful parses never produce an empty field or a `.git` dest
        #[test]
        fn parsed_fields_are_non_empty(input in "[a-z:/@._ -]{0,40}") {
            if let Ok(job) = parse(&input) {
                prop_assert!(!job.base_url().is_empty());
                prop_assert!(!job.remote_src().is_empty());
                prop_assert!(!job.dest().as_os_str().is_empty());
                prop_assert!(!job.dest().to_string_lossy().ends_with(".git"));
            }
        }
    }
}
