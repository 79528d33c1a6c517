//! Reading and writing the bookmark file.
//!
//! ```xml
//! <menu name="Root Label">
//!  <item><text>Label</text><action type="www">https://…</action><icon>relative/path.png</icon></item>
//!  <item><separator/></item>
//!  <menu name="Submenu"><icon>path.png</icon> … </menu>
//! </menu>
//! ```

use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::ParseError;
use crate::node::{IdAllocator, Kind, Node};

const MENU: &[u8] = b"menu";
const ITEM: &[u8] = b"item";
const TEXT: &[u8] = b"text";
const ACTION: &[u8] = b"action";
const ICON: &[u8] = b"icon";
const SEPARATOR: &[u8] = b"separator";

/// Parse a bookmark document into a tree.
///
/// Ids are taken from `ids` in document order, the root first.
/// Elements which are not understood are skipped.
/// Text content is kept as written, whitespace between elements is ignored.
///
/// # Errors
///
/// Errors when the document is not well-formed or has no `<menu>` root.
pub fn parse(xml: &str, ids: &mut IdAllocator) -> Result<Node, ParseError> {
    let reader = Reader::from_str(xml);
    let mut parser = Parser { reader, ids };

    loop {
        match parser.next()? {
            Event::Start(start) if start.name().as_ref() == MENU => {
                return parser.menu(&start, false);
            }
            Event::Empty(start) if start.name().as_ref() == MENU => {
                return parser.menu(&start, true);
            }
            Event::Start(_) | Event::Empty(_) | Event::Eof => return Err(ParseError::MissingRoot),
            _ => {}
        }
    }
}

struct Parser<'xml, 'ids> {
    reader: Reader<&'xml [u8]>,
    ids: &'ids mut IdAllocator,
}

impl<'xml> Parser<'xml, '_> {
    fn error<E>(&self, source: E) -> ParseError
    where
        E: Into<quick_xml::Error>,
    {
        ParseError::Xml {
            position: self.reader.buffer_position(),
            source: source.into(),
        }
    }

    fn next(&mut self) -> Result<Event<'xml>, ParseError> {
        self.reader.read_event().map_err(|err| self.error(err))
    }

    fn skip(&mut self, start: &BytesStart) -> Result<(), ParseError> {
        self.reader
            .read_to_end(start.name())
            .map(|_| ())
            .map_err(|err| self.error(err))
    }

    fn attribute(&self, start: &BytesStart, name: &[u8]) -> Result<Option<String>, ParseError> {
        for attribute in start.attributes() {
            let attribute = attribute.map_err(|err| self.error(err))?;
            if attribute.key.as_ref() == name {
                let value = attribute.unescape_value().map_err(|err| self.error(err))?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    /// Text content up to the end of the current element. Nested elements are skipped.
    fn text(&mut self, element: &'static str) -> Result<String, ParseError> {
        let mut content = String::new();
        loop {
            match self.next()? {
                Event::Text(text) => {
                    let text = text.unescape().map_err(|err| self.error(err))?;
                    content.push_str(&text);
                }
                Event::CData(data) => content.push_str(&String::from_utf8_lossy(&data)),
                Event::Start(start) => self.skip(&start)?,
                Event::End(_) => return Ok(content),
                Event::Eof => return Err(ParseError::UnexpectedEof(element)),
                _ => {}
            }
        }
    }

    fn optional_text(&mut self, element: &'static str) -> Result<Option<String>, ParseError> {
        let content = self.text(element)?;
        Ok((!content.is_empty()).then_some(content))
    }

    fn menu(&mut self, start: &BytesStart, empty: bool) -> Result<Node, ParseError> {
        let name = self.attribute(start, b"name")?.unwrap_or_default();
        let mut group = Node::group(self.ids, name);
        if empty {
            return Ok(group);
        }

        loop {
            match self.next()? {
                Event::Start(child) => match child.name().as_ref() {
                    MENU => {
                        let submenu = self.menu(&child, false)?;
                        group.children.push(submenu);
                    }
                    ITEM => {
                        let item = self.item()?;
                        group.children.push(item);
                    }
                    ICON => group.icon = self.optional_text("icon")?,
                    _ => self.skip(&child)?,
                },
                Event::Empty(child) => match child.name().as_ref() {
                    MENU => {
                        let submenu = self.menu(&child, true)?;
                        group.children.push(submenu);
                    }
                    ITEM => tracing::warn!(menu = %group.text, "ignoring empty <item/>"),
                    _ => {}
                },
                Event::End(_) => return Ok(group),
                Event::Eof => return Err(ParseError::UnexpectedEof("menu")),
                _ => {}
            }
        }
    }

    /// Parse the content of an `<item>`. The id is allocated once the item is complete.
    fn item(&mut self) -> Result<Node, ParseError> {
        let mut text = String::new();
        let mut kind = Kind::Link;
        let mut action = None;
        let mut icon = None;
        let mut separator = false;

        loop {
            match self.next()? {
                Event::Start(child) => match child.name().as_ref() {
                    TEXT => text = self.text("text")?,
                    ACTION => {
                        kind = self.action_kind(&child)?;
                        action = self.optional_text("action")?;
                    }
                    ICON => icon = self.optional_text("icon")?,
                    SEPARATOR => {
                        separator = true;
                        self.skip(&child)?;
                    }
                    _ => self.skip(&child)?,
                },
                Event::Empty(child) => match child.name().as_ref() {
                    ACTION => kind = self.action_kind(&child)?,
                    SEPARATOR => separator = true,
                    _ => {}
                },
                Event::End(_) => break,
                Event::Eof => return Err(ParseError::UnexpectedEof("item")),
                _ => {}
            }
        }

        if separator {
            return Ok(Node::separator(self.ids));
        }
        let mut node = Node::new(self.ids, kind);
        node.text = text;
        node.action = action;
        node.icon = icon;
        Ok(node)
    }

    fn action_kind(&self, action: &BytesStart) -> Result<Kind, ParseError> {
        let Some(tag) = self.attribute(action, b"type")? else {
            return Ok(Kind::Link);
        };
        Ok(Kind::from_tag(&tag).unwrap_or_else(|| {
            tracing::warn!(tag = %tag, "unknown action type, treating it as a link");
            Kind::Link
        }))
    }
}

/// Serialize a tree into the bookmark format, indented by one space per level.
///
/// The format has no place for children of links and separators or for the action of a group.
/// These are not written and a warning is logged.
///
/// # Errors
///
/// Only errors when the underlying writer does, which does not happen for the in-memory buffer used here.
pub fn to_vec(root: &Node) -> quick_xml::Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 1);
    write_group(&mut writer, root)?;
    Ok(writer.into_inner())
}

fn write_group(writer: &mut Writer<Vec<u8>>, group: &Node) -> quick_xml::Result<()> {
    if let Some(action) = &group.action {
        tracing::warn!(id = %group.id, action = %action, "group actions are not saved");
    }
    let mut start = BytesStart::new("menu");
    start.push_attribute(("name", group.text.as_str()));
    if group.icon.is_none() && group.children.is_empty() {
        return writer.write_event(Event::Empty(start));
    }

    writer.write_event(Event::Start(start))?;
    if let Some(icon) = &group.icon {
        write_text_element(writer, "icon", icon)?;
    }
    for child in &group.children {
        match child.kind {
            Kind::Group => write_group(writer, child)?,
            Kind::Link => write_link(writer, child)?,
            Kind::Separator => write_separator(writer, child)?,
        }
    }
    writer.write_event(Event::End(BytesEnd::new("menu")))
}

fn write_link(writer: &mut Writer<Vec<u8>>, link: &Node) -> quick_xml::Result<()> {
    if !link.children.is_empty() {
        tracing::warn!(
            id = %link.id,
            children = link.children.len(),
            "link children are not saved"
        );
    }
    writer.write_event(Event::Start(BytesStart::new("item")))?;
    write_text_element(writer, "text", &link.text)?;

    let mut action = BytesStart::new("action");
    action.push_attribute(("type", Kind::Link.tag()));
    match &link.action {
        Some(target) => {
            writer.write_event(Event::Start(action))?;
            writer.write_event(Event::Text(BytesText::new(target)))?;
            writer.write_event(Event::End(BytesEnd::new("action")))?;
        }
        None => writer.write_event(Event::Empty(action))?,
    }

    if let Some(icon) = &link.icon {
        write_text_element(writer, "icon", icon)?;
    }
    writer.write_event(Event::End(BytesEnd::new("item")))
}

fn write_separator(writer: &mut Writer<Vec<u8>>, separator: &Node) -> quick_xml::Result<()> {
    if !separator.children.is_empty() {
        tracing::warn!(
            id = %separator.id,
            children = separator.children.len(),
            "separator children are not saved"
        );
    }
    writer.write_event(Event::Start(BytesStart::new("item")))?;
    writer.write_event(Event::Empty(BytesStart::new("separator")))?;
    writer.write_event(Event::End(BytesEnd::new("item")))
}

fn write_text_element(
    writer: &mut Writer<Vec<u8>>,
    name: &str,
    text: &str,
) -> quick_xml::Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))
}
