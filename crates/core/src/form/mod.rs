//! Form filling on a parsed document.
//!
//! A [`Form`] is a view over one `<form>` element of a [`Document`]. Every
//! setter mutates the document tree in place: `value` attributes for
//! inputs, `checked` for checkboxes and radios, `selected` for options and
//! the text content of textareas. A later submission step serializes the
//! mutated tree; this module never encodes or sends anything itself.

mod error;
mod snapshot;
mod value;

pub use error::{FormError, Result};
pub use snapshot::FieldSnapshot;
pub use value::FieldValue;

use crate::dom::{self, Document, Handle};
use std::rc::Rc;
use tracing::{debug, trace, warn};

/// Behavior switches for a [`Form`].
#[derive(Debug, Clone)]
pub struct FormConfig {
    /// Uncheck every box of a checkbox group before applying a new set of
    /// choices. Turn off to keep server-prefilled boxes checked.
    pub uncheck_other_boxes: bool,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            uncheck_other_boxes: true,
        }
    }
}

/// Kinds of control a value can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Checkbox,
    Radio,
    Input,
    Textarea,
    Select,
}

impl ControlKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlKind::Checkbox => "checkbox",
            ControlKind::Radio => "radio",
            ControlKind::Input => "input",
            ControlKind::Textarea => "textarea",
            ControlKind::Select => "select",
        }
    }
}

/// Order in which [`Form::set`] tries each kind of control. Checkboxes and
/// radios come before plain inputs so that a name bound to a choice group
/// always gets choice semantics.
pub const DISPATCH_ORDER: [ControlKind; 5] = [
    ControlKind::Checkbox,
    ControlKind::Radio,
    ControlKind::Input,
    ControlKind::Textarea,
    ControlKind::Select,
];

/// Result of routing one value to one kind of control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Applied,
    /// The name exists in the form, but not on this kind of control.
    WrongType,
    /// Nothing in the form carries the name.
    NotFound,
}

/// Identifies the submit control to activate.
#[derive(Debug, Clone)]
pub enum SubmitChoice {
    /// A submit node of the form, matched by identity.
    Node(Handle),
    /// The value of the control's `name` attribute.
    Name(String),
}

impl SubmitChoice {
    fn matches(&self, node: &Handle) -> bool {
        match self {
            SubmitChoice::Node(handle) => Rc::ptr_eq(handle, node),
            SubmitChoice::Name(name) => dom::attr(node, "name").as_deref() == Some(name.as_str()),
        }
    }

    fn describe(&self) -> String {
        match self {
            SubmitChoice::Node(handle) => dom::outer_html(handle),
            SubmitChoice::Name(name) => name.clone(),
        }
    }
}

impl From<&str> for SubmitChoice {
    fn from(name: &str) -> Self {
        SubmitChoice::Name(name.to_string())
    }
}

impl From<String> for SubmitChoice {
    fn from(name: String) -> Self {
        SubmitChoice::Name(name)
    }
}

impl From<Handle> for SubmitChoice {
    fn from(node: Handle) -> Self {
        SubmitChoice::Node(node)
    }
}

impl From<&Handle> for SubmitChoice {
    fn from(node: &Handle) -> Self {
        SubmitChoice::Node(node.clone())
    }
}

/// A fillable view over one `<form>` element.
///
/// The view borrows the [`Document`] that owns the tree, so it can never
/// outlive it.
pub struct Form<'doc> {
    document: &'doc Document,
    form: Handle,
    config: FormConfig,
}

impl<'doc> Form<'doc> {
    /// Wrap a form node of `document`.
    pub fn new(document: &'doc Document, form: Handle) -> Self {
        Self {
            document,
            form,
            config: FormConfig::default(),
        }
    }

    /// The `index`-th `<form>` of the document, in document order.
    pub fn find(document: &'doc Document, index: usize) -> Result<Self> {
        let form = document.forms().into_iter().nth(index).ok_or_else(|| {
            FormError::ElementNotFound(format!("No form at index {}", index))
        })?;
        Ok(Self::new(document, form))
    }

    pub fn with_config(mut self, config: FormConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// The wrapped `<form>` node.
    pub fn node(&self) -> &Handle {
        &self.form
    }

    // ---- text inputs ----------------------------------------------------

    /// Set the `value` attribute of the first input carrying each name.
    pub fn set_input<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let outcome = self.apply_input(name, &value.into())?;
            self.require_applied(outcome, name, ControlKind::Input)?;
        }
        Ok(())
    }

    /// Alias of [`Form::set_input`], used for file inputs.
    pub fn attach<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        self.set_input(data)
    }

    fn apply_input(&self, name: &str, value: &FieldValue) -> Result<Outcome> {
        let Some(input) = dom::find_first(&self.form, "input", &[("name", name)]) else {
            return Ok(self.missing(name));
        };
        let text = scalar_text(name, value)?;
        dom::set_attr(&input, "value", &text);
        debug!(field = name, value = %text, "set input");
        Ok(Outcome::Applied)
    }

    // ---- checkboxes -----------------------------------------------------

    /// Check boxes of each named checkbox group, using the configured
    /// [`FormConfig::uncheck_other_boxes`] policy.
    pub fn set_checkbox<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        let uncheck_other_boxes = self.config.uncheck_other_boxes;
        self.set_checkbox_with(data, uncheck_other_boxes)
    }

    /// Check boxes of each named checkbox group.
    ///
    /// A value may be a scalar or a list. Each text choice checks the first
    /// box whose `value` (default `"on"`) equals it; `true`/`false` check or
    /// uncheck the first box of the group. With `uncheck_other_boxes` the
    /// whole group is cleared first so the result is exactly the given set.
    pub fn set_checkbox_with<K, V>(
        &mut self,
        data: impl IntoIterator<Item = (K, V)>,
        uncheck_other_boxes: bool,
    ) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let outcome = self.apply_checkbox(name, &value.into(), uncheck_other_boxes)?;
            self.require_applied(outcome, name, ControlKind::Checkbox)?;
        }
        Ok(())
    }

    fn apply_checkbox(
        &self,
        name: &str,
        value: &FieldValue,
        uncheck_other_boxes: bool,
    ) -> Result<Outcome> {
        let group = self.inputs_of_type(name, "checkbox");
        if group.is_empty() {
            return Ok(self.missing(name));
        }

        // Resolve every choice before touching the tree.
        let mut actions: Vec<(&Handle, bool)> = Vec::new();
        for choice in value.choices() {
            let action = match choice {
                FieldValue::Text(text) => group
                    .iter()
                    .find(|node| choice_value(node) == *text)
                    .map(|node| (node, true)),
                FieldValue::Bool(flag) => {
                    let text = flag.to_string();
                    match group.iter().find(|node| choice_value(node) == text) {
                        Some(node) => Some((node, true)),
                        None => group.first().map(|node| (node, *flag)),
                    }
                }
                FieldValue::List(_) => {
                    return Err(FormError::InvalidValue {
                        name: name.to_string(),
                        reason: "nested lists are not accepted".to_string(),
                    })
                }
            };
            match action {
                Some(action) => actions.push(action),
                None => {
                    return Err(FormError::ElementNotFound(format!(
                        "No input checkbox named {} with choice {}",
                        name, choice
                    )))
                }
            }
        }

        if uncheck_other_boxes {
            for node in &group {
                dom::remove_attr(node, "checked");
            }
        }
        for (node, checked) in actions {
            if checked {
                dom::set_attr(node, "checked", "");
            } else {
                dom::remove_attr(node, "checked");
            }
        }
        debug!(field = name, value = %value, uncheck_other_boxes, "set checkbox");
        Ok(Outcome::Applied)
    }

    /// Remove `checked` from every input carrying `name`.
    pub fn uncheck_all(&self, name: &str) {
        for input in dom::find_all(&self.form, "input", &[("name", name)]) {
            dom::remove_attr(&input, "checked");
        }
    }

    // ---- radios ---------------------------------------------------------

    /// Check one radio button per named group, unchecking the rest.
    pub fn set_radio<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let outcome = self.apply_radio(name, &value.into())?;
            self.require_applied(outcome, name, ControlKind::Radio)?;
        }
        Ok(())
    }

    fn apply_radio(&self, name: &str, value: &FieldValue) -> Result<Outcome> {
        let group = self.inputs_of_type(name, "radio");
        if group.is_empty() {
            return Ok(self.missing(name));
        }
        if value.is_list() {
            return Err(FormError::InvalidValue {
                name: name.to_string(),
                reason: "a radio group takes a single value".to_string(),
            });
        }
        let text = scalar_text(name, value)?;
        let target = group
            .iter()
            .find(|node| choice_value(node) == text)
            .ok_or_else(|| {
                FormError::ElementNotFound(format!(
                    "No input radio named {} with choice {}",
                    name, text
                ))
            })?;

        for node in &group {
            dom::remove_attr(node, "checked");
        }
        dom::set_attr(target, "checked", "");
        debug!(field = name, value = %text, "set radio");
        Ok(Outcome::Applied)
    }

    // ---- legacy checkbox/radio ------------------------------------------

    /// Check checkboxes or radios without caring which one a name is.
    ///
    /// Checkbox groups are updated without clearing unaddressed boxes.
    /// Radios are matched by value text only, so `true` checks the radio
    /// valued `"true"` rather than the first one of the group.
    pub fn check<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let value = value.into();
            if self.apply_checkbox(name, &value, false)? == Outcome::Applied {
                continue;
            }
            if self.apply_radio(name, &value)? == Outcome::Applied {
                continue;
            }
            return Err(FormError::ElementNotFound(format!(
                "No input checkbox/radio named {}",
                name
            )));
        }
        Ok(())
    }

    // ---- textareas ------------------------------------------------------

    /// Replace the text of the first textarea carrying each name.
    pub fn set_textarea<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let outcome = self.apply_textarea(name, &value.into())?;
            self.require_applied(outcome, name, ControlKind::Textarea)?;
        }
        Ok(())
    }

    fn apply_textarea(&self, name: &str, value: &FieldValue) -> Result<Outcome> {
        let Some(textarea) = dom::find_first(&self.form, "textarea", &[("name", name)]) else {
            return Ok(self.missing(name));
        };
        let text = scalar_text(name, value)?;
        dom::set_text(&textarea, &text);
        debug!(field = name, "set textarea");
        Ok(Outcome::Applied)
    }

    // ---- selects --------------------------------------------------------

    /// Select options of the first select carrying each name.
    ///
    /// Options are matched by `value`, then by their text. A list selects
    /// several options and needs a `<select multiple>`.
    pub fn set_select<K, V>(&mut self, data: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: AsRef<str>,
        V: Into<FieldValue>,
    {
        for (name, value) in data {
            let name = name.as_ref();
            let outcome = self.apply_select(name, &value.into())?;
            self.require_applied(outcome, name, ControlKind::Select)?;
        }
        Ok(())
    }

    fn apply_select(&self, name: &str, value: &FieldValue) -> Result<Outcome> {
        let Some(select) = dom::find_first(&self.form, "select", &[("name", name)]) else {
            return Ok(self.missing(name));
        };
        if value.is_list() && !dom::has_attr(&select, "multiple") {
            return Err(FormError::InvalidValue {
                name: name.to_string(),
                reason: "cannot select multiple options".to_string(),
            });
        }

        let options = dom::find_all(&select, "option", &[]);
        let mut chosen = Vec::new();
        for choice in value.choices() {
            let text = scalar_text(name, choice)?;
            let option = options
                .iter()
                .find(|o| dom::attr(o, "value").as_deref() == Some(text.as_str()))
                .or_else(|| options.iter().find(|o| dom::text_content(o).trim() == text))
                .ok_or_else(|| {
                    FormError::ElementNotFound(format!(
                        "Option {} not found for select {}",
                        text, name
                    ))
                })?;
            chosen.push(option);
        }

        for option in &options {
            dom::remove_attr(option, "selected");
        }
        for option in chosen {
            dom::set_attr(option, "selected", "selected");
        }
        debug!(field = name, value = %value, "set select");
        Ok(Outcome::Applied)
    }

    // ---- dispatch -------------------------------------------------------

    fn apply(&self, kind: ControlKind, name: &str, value: &FieldValue) -> Result<Outcome> {
        match kind {
            ControlKind::Checkbox => {
                self.apply_checkbox(name, value, self.config.uncheck_other_boxes)
            }
            ControlKind::Radio => self.apply_radio(name, value),
            ControlKind::Input => self.apply_input(name, value),
            ControlKind::Textarea => self.apply_textarea(name, value),
            ControlKind::Select => self.apply_select(name, value),
        }
    }

    /// Set a control without knowing its type.
    ///
    /// Kinds are tried in [`DISPATCH_ORDER`]; the first one that holds the
    /// name takes the value, and its errors are returned as-is. When no
    /// control carries the name, `force` creates a new input for it.
    /// Returns the kind of control that took the value.
    pub fn set(
        &mut self,
        name: &str,
        value: impl Into<FieldValue>,
        force: bool,
    ) -> Result<ControlKind> {
        let value = value.into();
        for kind in DISPATCH_ORDER {
            match self.apply(kind, name, &value)? {
                Outcome::Applied => return Ok(kind),
                outcome => trace!(field = name, kind = kind.as_str(), ?outcome, "no match, trying next kind"),
            }
        }

        if force {
            self.new_control("input", name, value, &[])?;
            return Ok(ControlKind::Input);
        }
        Err(FormError::ElementNotFound(format!(
            "No valid element named {}",
            name
        )))
    }

    /// `form[name] = value`: [`Form::set`] without forcing.
    pub fn set_field(&mut self, name: &str, value: impl Into<FieldValue>) -> Result<()> {
        self.set(name, value, false).map(|_| ())
    }

    /// Current value of the first control carrying `name`.
    ///
    /// Checkbox and radio groups report the value of their first checked
    /// box, selects the value of their first selected option (or of the
    /// first option when none is selected).
    pub fn get(&self, name: &str) -> Option<String> {
        let node = dom::find_first(&self.form, "", &[("name", name)])?;
        match dom::tag_name(&node)?.as_str() {
            "input" => {
                let input_type = input_type(&node);
                if input_type == "checkbox" || input_type == "radio" {
                    self.inputs_of_type(name, &input_type)
                        .iter()
                        .find(|n| dom::has_attr(n, "checked"))
                        .map(choice_value)
                } else {
                    Some(dom::attr(&node, "value").unwrap_or_default())
                }
            }
            "textarea" => Some(dom::text_content(&node)),
            "select" => {
                let options = dom::find_all(&node, "option", &[]);
                options
                    .iter()
                    .find(|o| dom::has_attr(o, "selected"))
                    .or_else(|| options.first())
                    .map(option_value)
            }
            _ => dom::attr(&node, "value"),
        }
    }

    // ---- synthetic controls ---------------------------------------------

    /// Create a new `<input>` for `name` and append it to the form.
    ///
    /// Every existing input and textarea carrying `name` is removed first.
    /// Selects and buttons with that name are kept. `extra_attrs` are
    /// applied last and may override `type`, `name` or `value`.
    pub fn new_control(
        &mut self,
        control_type: &str,
        name: &str,
        value: impl Into<FieldValue>,
        extra_attrs: &[(&str, &str)],
    ) -> Result<Handle> {
        let text = scalar_text(name, &value.into())?;

        let mut removed = dom::find_all(&self.form, "input", &[("name", name)]);
        removed.extend(dom::find_all(&self.form, "textarea", &[("name", name)]));
        if !removed.is_empty() {
            warn!(field = name, count = removed.len(), "removing existing controls before creating a new one");
        }
        for old in &removed {
            dom::decompose(old);
        }

        let control = self.document.create_element(
            "input",
            &[("type", control_type), ("name", name), ("value", text.as_str())],
        );
        for (attr, attr_value) in extra_attrs {
            dom::set_attr(&control, attr, attr_value);
        }
        dom::append_child(&self.form, control.clone());
        debug!(field = name, control_type, "created control");
        Ok(control)
    }

    // ---- submit ---------------------------------------------------------

    /// `input` and `button` elements of the form with `type="submit"`.
    pub fn submit_controls(&self) -> Vec<Handle> {
        dom::descendants(&self.form)
            .into_iter()
            .filter(|node| dom::is_element(node, "input") || dom::is_element(node, "button"))
            .filter(|node| {
                dom::attr(node, "type")
                    .map(|t| t.eq_ignore_ascii_case("submit"))
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Pick the submit control that would be clicked.
    ///
    /// Exactly one submit control must match. All others lose their `name`
    /// attribute so they are left out of the submitted data. On error the
    /// tree is left unchanged.
    pub fn choose_submit(&mut self, choice: impl Into<SubmitChoice>) -> Result<()> {
        let choice = choice.into();
        let submits = self.submit_controls();
        let matched: Vec<&Handle> = submits.iter().filter(|node| choice.matches(node)).collect();

        match matched.len() {
            0 => {
                return Err(FormError::ElementNotFound(format!(
                    "Specified submit element not found: {}",
                    choice.describe()
                )))
            }
            1 => {}
            _ => {
                return Err(FormError::AmbiguousSelection(format!(
                    "Multiple submit elements match: {}",
                    choice.describe()
                )))
            }
        }

        let chosen = matched[0];
        for node in &submits {
            if !Rc::ptr_eq(node, chosen) && dom::remove_attr(node, "name") {
                trace!("removed name from unchosen submit control");
            }
        }
        debug!(submit = %choice.describe(), "chose submit control");
        Ok(())
    }

    // ---- inspection -----------------------------------------------------

    /// Snapshots of every input, textarea, select and button.
    pub fn fields(&self) -> Vec<FieldSnapshot> {
        self.controls().iter().map(FieldSnapshot::read).collect()
    }

    /// One line per control with its attributes and trimmed text.
    pub fn summary(&self) -> String {
        let lines: Vec<String> = self.controls().iter().map(snapshot::summary_line).collect();
        lines.join("\n")
    }

    /// Outer HTML of the form in its current state.
    pub fn to_html(&self) -> String {
        dom::outer_html(&self.form)
    }

    // ---- helpers --------------------------------------------------------

    fn controls(&self) -> Vec<Handle> {
        dom::descendants(&self.form)
            .into_iter()
            .filter(|node| {
                snapshot::CONTROL_TAGS
                    .iter()
                    .any(|tag| dom::is_element(node, tag))
            })
            .collect()
    }

    fn inputs_of_type(&self, name: &str, input_kind: &str) -> Vec<Handle> {
        dom::find_all(&self.form, "input", &[("name", name)])
            .into_iter()
            .filter(|node| input_type(node) == input_kind)
            .collect()
    }

    /// Why a kind-specific lookup failed for `name`.
    fn missing(&self, name: &str) -> Outcome {
        if dom::find_first(&self.form, "", &[("name", name)]).is_some() {
            Outcome::WrongType
        } else {
            Outcome::NotFound
        }
    }

    fn require_applied(&self, outcome: Outcome, name: &str, kind: ControlKind) -> Result<()> {
        match outcome {
            Outcome::Applied => Ok(()),
            Outcome::WrongType => Err(FormError::WrongElementType {
                name: name.to_string(),
                expected: kind.as_str(),
            }),
            Outcome::NotFound => Err(FormError::ElementNotFound(format!(
                "No {} named {}",
                kind.as_str(),
                name
            ))),
        }
    }
}

/// Lowercased `type` of an input, `"text"` when absent.
pub(crate) fn input_type(node: &Handle) -> String {
    dom::attr(node, "type")
        .map(|t| t.to_ascii_lowercase())
        .unwrap_or_else(|| "text".to_string())
}

/// Value a checkbox or radio submits, `"on"` when absent.
pub(crate) fn choice_value(node: &Handle) -> String {
    dom::attr(node, "value").unwrap_or_else(|| "on".to_string())
}

/// Value of an option: its `value` attribute, else its trimmed text.
pub(crate) fn option_value(node: &Handle) -> String {
    dom::attr(node, "value").unwrap_or_else(|| dom::text_content(node).trim().to_string())
}

fn scalar_text(name: &str, value: &FieldValue) -> Result<String> {
    value.as_text().ok_or_else(|| FormError::InvalidValue {
        name: name.to_string(),
        reason: "a list is not accepted here".to_string(),
    })
}
