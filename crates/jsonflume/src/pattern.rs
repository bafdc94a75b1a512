//! Path-pattern compilation and matching.
//!
//! A pattern selects nodes by the path descended to reach them, in a
//! JSONPath-like notation:
//!
//! | token        | meaning                                             |
//! |--------------|-----------------------------------------------------|
//! | `foo`        | a property named `foo`                              |
//! | `["foo"]`    | the same, array-of-strings notation                 |
//! | `[2]`        | the element at index 2                              |
//! | `*` / `[*]`  | any property or element                             |
//! | `{a b}`      | any node, but only if it has fields `a` and `b`     |
//! | `.`          | separator                                           |
//! | `..`         | any number of intermediate levels                   |
//! | `!`          | the document root                                   |
//! | `$`          | prefix marking the clause whose node is returned    |
//!
//! A pattern that does not start with `!` may match at any depth. Names and
//! indices compare loosely: the pattern `[2]` matches a property named `"2"`
//! and the pattern `x.2` matches index 2 of an array at `x`. A node test may
//! carry a duck-type field list, as in `person{name age}`.
//!
//! Compilation tokenizes the pattern left to right into a clause list;
//! matching interprets that list right to left against the path, deepest
//! component first.
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::{error::PatternError, path::PathComponent, value::Value};

/// A single test in a compiled pattern.
#[derive(Debug, Clone, PartialEq)]
enum Clause {
    /// One path level: a node test plus an optional duck-type field list.
    Node {
        capture: bool,
        test: NodeTest,
        fields: Vec<String>,
    },
    /// `..` — skips zero or more levels, as few as possible.
    RecursiveDescent,
    /// `!` — the root of the document.
    Root { capture: bool },
}

#[derive(Debug, Clone, PartialEq)]
enum NodeTest {
    Named(String),
    Indexed(usize),
    Wildcard,
}

/// A key matches its own text; an index matches when the text is its decimal
/// form.
fn matches_name(component: &PathComponent, name: &str) -> bool {
    match component {
        PathComponent::Key(key) => key == name,
        PathComponent::Index(index) => name.parse::<usize>().is_ok_and(|n| n == *index),
    }
}

fn matches_index(component: &PathComponent, index: usize) -> bool {
    match component {
        PathComponent::Key(key) => key.parse::<usize>().is_ok_and(|n| n == index),
        PathComponent::Index(i) => *i == index,
    }
}

static NAMED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)(\w+)(?:\{([\w, ]*)\})?").unwrap());
static INDEXED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)\[(\d+)\](?:\{([\w, ]*)\})?").unwrap());
static QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"^(\$?)\["(\w+)"\](?:\{([\w, ]*)\})?"#).unwrap());
static STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)(?:\*|\[\*\])(?:\{([\w, ]*)\})?").unwrap());
static BARE_FIELDS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\$?)\{([\w, ]*)\}").unwrap());
static DOUBLE_DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.\.").unwrap());
static DOT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.").unwrap());
static BANG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\$?)!").unwrap());

fn split_fields(list: Option<regex::Match<'_>>) -> Vec<String> {
    list.map(|m| {
        m.as_str()
            .split(|c: char| !c.is_alphanumeric() && c != '_')
            .filter(|f| !f.is_empty())
            .map(str::to_owned)
            .collect()
    })
    .unwrap_or_default()
}

/// Result of testing one candidate path against a pattern.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PathMatch<'a> {
    /// The path does not satisfy the pattern.
    Miss,
    /// The path satisfies the pattern. Carries the selected node (the
    /// captured clause's node, or the candidate itself) when that node is
    /// known to the caller.
    Hit(Option<&'a Value>),
}

impl PathMatch<'_> {
    /// Returns `true` for any hit, captured node known or not.
    #[must_use]
    pub fn is_hit(&self) -> bool {
        matches!(self, PathMatch::Hit(_))
    }
}

struct Candidate<'a, 'v> {
    path: &'a [PathComponent],
    /// Nodes above the candidate, root first. Entry `d` is the node reached
    /// by `path[..d]`.
    ancestors: &'a [&'v Value],
    candidate: Option<&'v Value>,
}

impl<'v> Candidate<'_, 'v> {
    /// The node one level below `path[si]`, so `si == -1` is the root and
    /// `si == path.len() - 1` is the candidate itself.
    fn node_at(&self, si: isize) -> Option<&'v Value> {
        let depth = usize::try_from(si + 1).ok()?;
        if depth == self.path.len() {
            self.candidate
        } else {
            self.ancestors.get(depth).copied()
        }
    }
}

/// A compiled path pattern.
///
/// Compiled once, matched many times; matching is a pure function of its
/// arguments, so one `JsonPath` may be shared freely.
///
/// # Examples
///
/// ```
/// use jsonflume::{JsonPath, PathMatch, path};
///
/// let pattern = JsonPath::compile("foods.*.name")?;
/// let path = path!["foods", 2, "name"];
/// assert!(pattern.evaluate(&path, &[], None).is_hit());
/// # Ok::<(), jsonflume::PatternError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct JsonPath {
    pattern: String,
    clauses: Vec<Clause>,
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pattern)
    }
}

impl JsonPath {
    /// Compiles a pattern.
    ///
    /// The empty pattern is valid and matches every node.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] with the offset of the first unrecognizable
    /// token. Pattern problems are never deferred to match time.
    pub fn compile(pattern: &str) -> Result<JsonPath, PatternError> {
        let mut clauses = Vec::new();
        let mut rest = pattern;
        while !rest.is_empty() {
            let Some(consumed) = Self::read_clause(rest, &mut clauses) else {
                return Err(PatternError {
                    pattern: pattern.to_owned(),
                    offset: pattern.len() - rest.len(),
                });
            };
            rest = &rest[consumed..];
        }
        Ok(JsonPath {
            pattern: pattern.to_owned(),
            clauses,
        })
    }

    /// The pattern text this was compiled from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Reads one token from the front of `rest`, appending at most one
    /// clause. Returns the number of bytes consumed, or `None` when nothing
    /// matches.
    fn read_clause(rest: &str, clauses: &mut Vec<Clause>) -> Option<usize> {
        if let Some(m) = NAMED.captures(rest) {
            clauses.push(Clause::Node {
                capture: !m[1].is_empty(),
                test: NodeTest::Named(m[2].to_owned()),
                fields: split_fields(m.get(3)),
            });
            return Some(m[0].len());
        }
        if let Some(m) = INDEXED.captures(rest) {
            let index = m[2].parse().ok()?;
            clauses.push(Clause::Node {
                capture: !m[1].is_empty(),
                test: NodeTest::Indexed(index),
                fields: split_fields(m.get(3)),
            });
            return Some(m[0].len());
        }
        if let Some(m) = QUOTED.captures(rest) {
            clauses.push(Clause::Node {
                capture: !m[1].is_empty(),
                test: NodeTest::Named(m[2].to_owned()),
                fields: split_fields(m.get(3)),
            });
            return Some(m[0].len());
        }
        if let Some(m) = STAR.captures(rest) {
            clauses.push(Clause::Node {
                capture: !m[1].is_empty(),
                test: NodeTest::Wildcard,
                fields: split_fields(m.get(2)),
            });
            return Some(m[0].len());
        }
        if let Some(m) = BARE_FIELDS.captures(rest) {
            clauses.push(Clause::Node {
                capture: !m[1].is_empty(),
                test: NodeTest::Wildcard,
                fields: split_fields(m.get(2)),
            });
            return Some(m[0].len());
        }
        if let Some(m) = DOUBLE_DOT.find(rest) {
            clauses.push(Clause::RecursiveDescent);
            return Some(m.len());
        }
        if let Some(m) = DOT.find(rest) {
            // separator only
            return Some(m.len());
        }
        if let Some(m) = BANG.captures(rest) {
            clauses.push(Clause::Root {
                capture: !m[1].is_empty(),
            });
            return Some(m[0].len());
        }
        None
    }

    /// Tests a candidate path against the pattern.
    ///
    /// `path` is the descent from the root to the candidate node;
    /// `ancestors` holds the nodes along that descent, root first, one per
    /// path prefix; `candidate` is the node at the end of the path when the
    /// caller knows it (a path listener probing ahead of the value passes
    /// `None`).
    ///
    /// On a hit, the returned node is the `$`-captured clause's node, or the
    /// candidate when nothing captures. Duck-type field lists are tested
    /// against the node at their clause's depth and fail when that node is
    /// unknown or not an object.
    #[must_use]
    pub fn evaluate<'v>(
        &self,
        path: &[PathComponent],
        ancestors: &[&'v Value],
        candidate: Option<&'v Value>,
    ) -> PathMatch<'v> {
        let ctx = Candidate {
            path,
            ancestors,
            candidate,
        };
        let top_clause = self.clauses.len() as isize - 1;
        let top_component = path.len() as isize - 1;
        match self.eval(top_clause, top_component, &ctx) {
            Some(Some(si)) => PathMatch::Hit(ctx.node_at(si)),
            Some(None) => PathMatch::Hit(candidate),
            None => PathMatch::Miss,
        }
    }

    /// Matches clause `ci` at stack position `si`, then the clauses to its
    /// left above it. `si == -1` is the root position. Returns the captured
    /// stack position, if any clause on the successful route captures.
    fn eval(&self, ci: isize, si: isize, ctx: &Candidate<'_, '_>) -> Option<Option<isize>> {
        let Ok(clause_index) = usize::try_from(ci) else {
            // Ran out of clauses: anything above the matched region is
            // accepted, which is what lets unanchored patterns match at any
            // depth.
            return Some(None);
        };
        match &self.clauses[clause_index] {
            Clause::Root { capture } => {
                (si == -1).then(|| capture.then_some(-1))
            }
            Clause::Node {
                capture,
                test,
                fields,
            } => {
                let passes = match test {
                    NodeTest::Wildcard => true,
                    NodeTest::Named(name) => {
                        si >= 0 && matches_name(&ctx.path[si as usize], name)
                    }
                    NodeTest::Indexed(index) => {
                        si >= 0 && matches_index(&ctx.path[si as usize], *index)
                    }
                };
                if !passes {
                    return None;
                }
                if !fields.is_empty() {
                    match ctx.node_at(si) {
                        Some(Value::Object(map))
                            if fields.iter().all(|f| map.contains_key(f)) => {}
                        _ => return None,
                    }
                }
                let inner = self.eval(ci - 1, si - 1, ctx)?;
                Some(if *capture { Some(si) } else { inner })
            }
            Clause::RecursiveDescent => {
                if si < -1 {
                    return None;
                }
                // Fewest levels first. The inner clause must be satisfied
                // somewhere above; reaching the root without it is a miss.
                self.eval(ci - 1, si, ctx)
                    .or_else(|| self.eval(ci, si - 1, ctx))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path;

    fn compiled(pattern: &str) -> JsonPath {
        JsonPath::compile(pattern).unwrap()
    }

    fn hits(pattern: &str, path: &[PathComponent]) -> bool {
        compiled(pattern).evaluate(path, &[], None).is_hit()
    }

    #[test]
    fn unanchored_names_match_at_any_depth() {
        assert!(hits("b", &path!["b"]));
        assert!(hits("b", &path!["a", "b"]));
        assert!(hits("a.b", &path!["a", "b"]));
        assert!(hits("a.b", &path!["x", "a", "b"]));
        assert!(!hits("a.b", &path!["a", "x", "b"]));
        assert!(!hits("a.b", &path!["b"]));
    }

    #[test]
    fn bang_anchors_at_the_root() {
        assert!(hits("!", &path![]));
        assert!(!hits("!", &path!["a"]));
        assert!(hits("!.a.b", &path!["a", "b"]));
        assert!(!hits("!.a.b", &path!["x", "a", "b"]));
    }

    #[test]
    fn recursive_descent_requires_the_outer_clause() {
        assert!(hits("a..b", &path!["a", "b"]));
        assert!(hits("a..b", &path!["a", "x", "y", "b"]));
        assert!(!hits("a..b", &path!["b"]));
        assert!(!hits("a..b", &path!["x", "b"]));
        assert!(hits("!..b", &path!["x", "y", "b"]));
        assert!(!hits("!..b", &path![]));
    }

    #[test]
    fn leading_double_dot_is_unanchored() {
        assert!(hits("..b", &path!["b"]));
        assert!(hits("..b", &path!["a", "b"]));
    }

    #[test]
    fn wildcards_match_any_component() {
        assert!(hits("*", &path!["anything"]));
        assert!(hits("*", &path![0]));
        assert!(hits("a.*", &path!["a", "b"]));
        assert!(hits("a.*", &path!["a", 3]));
        assert!(!hits("a.*", &path!["b", "c"]));
        assert!(hits("b[*]", &path!["b", 0]));
        assert!(!hits("b[*]", &path!["c", 0]));
    }

    #[test]
    fn array_notations_and_loose_equality() {
        assert!(hits("[2]", &path![2]));
        assert!(hits("[2]", &path!["2"]));
        assert!(!hits("[2]", &path![3]));
        assert!(hits(r#"["name"]"#, &path!["name"]));
        assert!(hits("a.2", &path!["a", 2]));
    }

    #[test]
    fn empty_pattern_matches_everything() {
        assert!(hits("", &path![]));
        assert!(hits("", &path!["a", 0, "b"]));
    }

    #[test]
    fn invalid_pattern_reports_the_offset() {
        let err = JsonPath::compile("foods.[").unwrap_err();
        assert_eq!(err.offset, 6);
        assert_eq!(err.pattern, "foods.[");
    }

    #[test]
    fn capture_selects_an_ancestor() {
        let root = Value::from(vec![]);
        let a: Value = 42.0.into();
        let path = path!["a", "b"];
        let ancestors = [&root, &a];
        let candidate: Value = true.into();

        let plain = compiled("a.b").evaluate(&path, &ancestors, Some(&candidate));
        assert_eq!(plain, PathMatch::Hit(Some(&candidate)));

        let captured = compiled("$a.b").evaluate(&path, &ancestors, Some(&candidate));
        assert_eq!(captured, PathMatch::Hit(Some(&a)));
    }

    #[test]
    fn capture_of_unknown_candidate_is_a_hit_without_a_node() {
        let outcome = compiled("a.b").evaluate(&path!["a", "b"], &[], None);
        assert_eq!(outcome, PathMatch::Hit(None));
    }

    #[test]
    fn duck_typing_requires_the_listed_fields() {
        let mut map = crate::value::Map::new();
        map.insert("name".to_owned(), Value::from("Bob"));
        map.insert("age".to_owned(), Value::from(42.0));
        let person = Value::Object(map);

        let pattern = compiled("{name age}");
        assert!(
            pattern
                .evaluate(&path!["people", 0], &[], Some(&person))
                .is_hit()
        );
        assert!(
            !compiled("{name age email}")
                .evaluate(&path!["people", 0], &[], Some(&person))
                .is_hit()
        );
        // Unknown candidate cannot satisfy a field list.
        assert!(!pattern.evaluate(&path!["people", 0], &[], None).is_hit());
        assert!(
            !pattern
                .evaluate(&path!["people", 0], &[], Some(&Value::from("Bob")))
                .is_hit()
        );
    }

    #[test]
    fn named_test_with_fields() {
        let mut map = crate::value::Map::new();
        map.insert("spin".to_owned(), Value::from(0.5));
        let particle = Value::Object(map);

        assert!(
            compiled("particle{spin}")
                .evaluate(&path!["particle"], &[], Some(&particle))
                .is_hit()
        );
        assert!(
            !compiled("particle{spin}")
                .evaluate(&path!["other"], &[], Some(&particle))
                .is_hit()
        );
    }

    #[test]
    fn display_round_trips_the_pattern() {
        assert_eq!(compiled("!.a..b[*]").to_string(), "!.a..b[*]");
    }
}
