//! Tree building and listener dispatch on top of [`StreamParser`].
//!
//! [`JsonStream`] assembles the document while it streams in and fires
//! registered callbacks as soon as their pattern is satisfied: path listeners
//! when a matching path is first reached (possibly before its value is
//! known), node listeners when a matching node has completely arrived.
//! Callbacks run synchronously inside [`write`](JsonStream::write), in
//! registration order.
//!
//! The container currently being filled is owned exclusively by the stream;
//! suspended ancestors each hold the key their in-progress child will occupy,
//! and a finished container is transferred into its parent only when it
//! closes. The tree is mutated before callbacks run, so a panicking callback
//! never leaves it half-updated.
use crate::{
    error::{ParseError, PatternError},
    event::ParseEvent,
    options::ParserOptions,
    parser::StreamParser,
    path::PathComponent,
    pattern::{JsonPath, PathMatch},
    value::{Map, Value},
};

/// Handle returned by listener registration, for later removal with
/// [`JsonStream::forget`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Matched node (when already known), the path that matched, and the
/// ancestor nodes root first.
type Callback = Box<dyn FnMut(Option<&Value>, &[PathComponent], &[&Value])>;

struct Listener {
    id: ListenerId,
    matcher: JsonPath,
    callback: Callback,
}

/// A suspended ancestor container and the key its in-progress child will be
/// stored under.
struct Frame {
    node: Value,
    child_key: PathComponent,
}

/// Streaming JSON reader with path-matching callbacks.
///
/// # Examples
///
/// ```
/// use std::{cell::RefCell, rc::Rc};
/// use jsonflume::JsonStream;
///
/// let names = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&names);
///
/// let mut stream = JsonStream::default();
/// stream.on_node("foods.*.name", move |node, _path, _ancestors| {
///     if let Some(node) = node {
///         sink.borrow_mut().push(node.to_string());
///     }
/// })?;
///
/// stream.write(r#"{"foods": [{"name": "aubergine"}, {"name": "kale"}]}"#)?;
/// stream.end()?;
/// assert_eq!(*names.borrow(), vec![r#""aubergine""#, r#""kale""#]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct JsonStream {
    parser: StreamParser,
    /// The container being filled. `None` before the root opens and after it
    /// closes.
    current: Option<Value>,
    /// The slot in `current` that the next value will occupy.
    current_key: Option<PathComponent>,
    frames: Vec<Frame>,
    root: Option<Value>,
    path_listeners: Vec<Listener>,
    node_listeners: Vec<Listener>,
    next_id: u64,
}

impl std::fmt::Debug for JsonStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonStream")
            .field("current", &self.current)
            .field("current_key", &self.current_key)
            .field("root", &self.root)
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

impl Default for JsonStream {
    fn default() -> Self {
        Self::new(ParserOptions::default())
    }
}

impl JsonStream {
    #[must_use]
    pub fn new(options: ParserOptions) -> Self {
        Self {
            parser: StreamParser::new(options),
            current: None,
            current_key: None,
            frames: Vec::new(),
            root: None,
            path_listeners: Vec::new(),
            node_listeners: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a callback for when a matching path is reached, which may be
    /// before the value at that path has arrived. The callback's first
    /// argument is `None` in that case.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the pattern does not compile.
    pub fn on_path<F>(&mut self, pattern: &str, callback: F) -> Result<ListenerId, PatternError>
    where
        F: FnMut(Option<&Value>, &[PathComponent], &[&Value]) + 'static,
    {
        let matcher = JsonPath::compile(pattern)?;
        Ok(self.push_listener(ListKind::Path, matcher, Box::new(callback)))
    }

    /// Registers a callback for when a matching node has completely arrived.
    ///
    /// # Errors
    ///
    /// Returns [`PatternError`] when the pattern does not compile.
    pub fn on_node<F>(&mut self, pattern: &str, callback: F) -> Result<ListenerId, PatternError>
    where
        F: FnMut(Option<&Value>, &[PathComponent], &[&Value]) + 'static,
    {
        let matcher = JsonPath::compile(pattern)?;
        Ok(self.push_listener(ListKind::Node, matcher, Box::new(callback)))
    }

    /// Removes a previously registered listener. Unknown ids are ignored.
    pub fn forget(&mut self, id: ListenerId) {
        self.path_listeners.retain(|l| l.id != id);
        self.node_listeners.retain(|l| l.id != id);
    }

    /// Feeds a chunk of JSON text, firing listeners for everything recognized
    /// in it before returning.
    ///
    /// # Errors
    ///
    /// Returns the parser's error for malformed input. Listeners for content
    /// recognized before the failure have already fired.
    pub fn write(&mut self, chunk: &str) -> Result<&mut Self, ParseError> {
        let outcome = self.parser.write(chunk).map(|_| ());
        self.dispatch();
        outcome.map(|()| self)
    }

    /// Signals end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when the document is incomplete.
    pub fn end(&mut self) -> Result<&mut Self, ParseError> {
        let outcome = self.parser.end().map(|_| ());
        self.dispatch();
        outcome.map(|()| self)
    }

    /// The completed document, once its root container has closed.
    #[must_use]
    pub fn root(&self) -> Option<&Value> {
        self.root.as_ref()
    }

    fn push_listener(&mut self, kind: ListKind, matcher: JsonPath, callback: Callback) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        let listener = Listener {
            id,
            matcher,
            callback,
        };
        match kind {
            ListKind::Path => self.path_listeners.push(listener),
            ListKind::Node => self.node_listeners.push(listener),
        }
        id
    }

    fn dispatch(&mut self) {
        let events: Vec<ParseEvent> = self.parser.events().collect();
        for event in events {
            match event {
                ParseEvent::Ready => {
                    self.frames.clear();
                    self.current = None;
                    self.current_key = None;
                }
                ParseEvent::OpenObject { first_key } => {
                    self.open_container(Value::Object(Map::new()));
                    self.current_key = None;
                    if let Some(key) = first_key {
                        self.on_key(key);
                    }
                }
                ParseEvent::OpenArray => {
                    self.open_container(Value::Array(Vec::new()));
                    self.current_key = Some(PathComponent::Index(0));
                }
                ParseEvent::Key(key) => self.on_key(key),
                ParseEvent::Value(value) => self.on_scalar(value),
                ParseEvent::CloseObject | ParseEvent::CloseArray => self.close_container(),
                ParseEvent::End => {}
            }
        }
    }

    /// Path components leading to `current`, root first.
    fn path_to_current(&self) -> Vec<PathComponent> {
        self.frames.iter().map(|f| f.child_key.clone()).collect()
    }

    fn notify(
        listeners: &mut [Listener],
        path: &[PathComponent],
        ancestors: &[&Value],
        candidate: Option<&Value>,
    ) {
        for listener in listeners {
            if let PathMatch::Hit(found) = listener.matcher.evaluate(path, ancestors, candidate) {
                (listener.callback)(found, path, ancestors);
            }
        }
    }

    /// A new container starts: announce its path, then suspend the parent
    /// and make the fresh container current.
    fn open_container(&mut self, fresh: Value) {
        let mut path = self.path_to_current();
        if self.current.is_some() {
            if let Some(key) = self.current_key.clone() {
                path.push(key);
            }
        }
        let ancestors: Vec<&Value> = self
            .frames
            .iter()
            .map(|f| &f.node)
            .chain(self.current.as_ref())
            .collect();
        Self::notify(&mut self.path_listeners, &path, &ancestors, Some(&fresh));

        if let Some(parent) = self.current.take() {
            if let Some(child_key) = self.current_key.take() {
                self.frames.push(Frame {
                    node: parent,
                    child_key,
                });
            }
        }
        self.current = Some(fresh);
    }

    /// A property name arrived: announce the path it opens, then make it the
    /// assignment slot.
    fn on_key(&mut self, key: String) {
        let mut path = self.path_to_current();
        path.push(PathComponent::Key(key.clone()));
        let ancestors: Vec<&Value> = self
            .frames
            .iter()
            .map(|f| &f.node)
            .chain(self.current.as_ref())
            .collect();
        Self::notify(&mut self.path_listeners, &path, &ancestors, None);
        self.current_key = Some(PathComponent::Key(key));
    }

    /// A scalar arrived: store it, announce it, advance the slot.
    fn on_scalar(&mut self, value: Value) {
        let Some(key) = self.current_key.clone() else {
            return;
        };
        let mut path = self.path_to_current();
        path.push(key.clone());

        match (&mut self.current, &key) {
            (Some(Value::Object(map)), PathComponent::Key(k)) => {
                map.insert(k.clone(), value);
            }
            (Some(Value::Array(items)), PathComponent::Index(_)) => items.push(value),
            _ => return,
        }
        let stored = self.current.as_ref().and_then(|cur| cur.child(&key));
        let ancestors: Vec<&Value> = self
            .frames
            .iter()
            .map(|f| &f.node)
            .chain(self.current.as_ref())
            .collect();
        Self::notify(&mut self.node_listeners, &path, &ancestors, stored);

        self.current_key = match key {
            PathComponent::Index(index) => Some(PathComponent::Index(index + 1)),
            PathComponent::Key(_) => None,
        };
    }

    /// The current container finished: announce it while detached, then
    /// transfer it into its parent (or store it as the document root) and
    /// restore the parent's slot.
    fn close_container(&mut self) {
        let Some(node) = self.current.take() else {
            return;
        };
        let path = self.path_to_current();
        let ancestors: Vec<&Value> = self.frames.iter().map(|f| &f.node).collect();
        Self::notify(&mut self.node_listeners, &path, &ancestors, Some(&node));

        match self.frames.pop() {
            Some(Frame {
                node: mut parent,
                child_key,
            }) => {
                match (&mut parent, &child_key) {
                    (Value::Object(map), PathComponent::Key(key)) => {
                        map.insert(key.clone(), node);
                        self.current_key = None;
                    }
                    (Value::Array(items), PathComponent::Index(index)) => {
                        items.push(node);
                        self.current_key = Some(PathComponent::Index(index + 1));
                    }
                    _ => {}
                }
                self.current = Some(parent);
            }
            None => {
                self.root = Some(node);
                self.current_key = None;
            }
        }
    }
}

enum ListKind {
    Path,
    Node,
}
