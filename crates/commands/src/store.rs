//! The static command table.
//!
//! Every user-issued command resolves here to a fixed behavior descriptor:
//! direction, whether to announce the landing position, the find predicate
//! it searches for, a platform filter, and the gating flags dispatch
//! honors. The table is immutable and built once.

use dom::NavPredicate;
use once_cell::sync::Lazy;
use speech::TtsProperty;
use std::collections::HashMap;

/// Direction a command moves the cursor (and wraps a search).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// Platforms a command is restricted to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    ChromeOs,
    Linux,
    Mac,
    Windows,
}

/// Best-effort compile-time platform; hosts on ChromeOS override it.
pub fn host_platform() -> Platform {
    if cfg!(target_os = "macos") {
        Platform::Mac
    } else if cfg!(target_os = "windows") {
        Platform::Windows
    } else {
        Platform::Linux
    }
}

/// The action a command performs once gating and bookkeeping are done.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    /// Step by the cursor's current granularity.
    Move,
    /// Step by a fixed granularity, regardless of the current one.
    MoveBy(pipeline::Granularity),
    /// Cycle the current granularity.
    CycleGranularity,
    /// Search for the next node matching a predicate, wrapping once.
    Find(NavPredicate),
    /// Jump to a document edge.
    JumpToTop,
    JumpToBottom,
    /// Start reading continuously from the current position.
    ReadFromHere,
    /// Silence speech and clear anything pending.
    StopSpeech,
    /// Speak the current position again.
    SpeakPosition,
    /// Speak the current position with full ancestor context.
    FullyDescribe,
    /// Speak the URL a focused link points at.
    ReadLinkUrl,
    /// Speak the document title.
    ReadCurrentTitle,
    /// Activate the current item (synthetic click).
    ActOnItem,
    /// Force a click even on non-interactive nodes.
    ForceClick,
    /// Adjust a TTS voice property; `true` increases.
    Tts(TtsProperty, bool),
    ToggleStickyMode,
    ToggleSearchWidget,
    /// Table navigation by row/column delta.
    TableMove(i8, i8),
    TableFirstCell,
    TableLastCell,
    TableLocation,
}

/// One command's fixed behavior descriptor.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub action: CommandAction,
    pub direction: Option<Direction>,
    /// Speak the cursor's description after a successful action.
    pub announce: bool,
    /// `None` means every platform.
    pub platforms: Option<&'static [Platform]>,
    /// Reject while focus is inside a text input (single-key navigation
    /// must not eat typed characters).
    pub skip_input: bool,
    /// Leave the event queue running during execution; the command wants
    /// its side-effect events announced naturally.
    pub allow_events: bool,
    /// Do not stop an in-progress continuous reading session.
    pub allow_continuation: bool,
}

const fn base(name: &'static str, action: CommandAction) -> CommandSpec {
    CommandSpec {
        name,
        action,
        direction: None,
        announce: false,
        platforms: None,
        skip_input: false,
        allow_events: false,
        allow_continuation: false,
    }
}

/// Granularity/object movement: announced, gated out of text inputs.
const fn nav(name: &'static str, action: CommandAction, direction: Direction) -> CommandSpec {
    let mut spec = base(name, action);
    spec.direction = Some(direction);
    spec.announce = true;
    spec.skip_input = true;
    spec
}

/// Find-next-matching commands: announced, wrapping search, input-gated.
const fn find(name: &'static str, predicate: NavPredicate, direction: Direction) -> CommandSpec {
    nav(name, CommandAction::Find(predicate), direction)
}

const fn tts(name: &'static str, property: TtsProperty, increase: bool) -> CommandSpec {
    let mut spec = base(name, CommandAction::Tts(property, increase));
    spec.allow_continuation = true;
    spec
}

fn all_commands() -> Vec<CommandSpec> {
    use CommandAction as Act;
    use Direction::{Backward, Forward};
    use NavPredicate as Pred;
    use pipeline::Granularity as Gran;

    let mut table = vec![
        // Core movement.
        nav("forward", Act::Move, Forward),
        nav("backward", Act::Move, Backward),
        nav("previousGranularity", Act::CycleGranularity, Backward),
        nav("nextGranularity", Act::CycleGranularity, Forward),
        nav("previousCharacter", Act::MoveBy(Gran::Character), Backward),
        nav("nextCharacter", Act::MoveBy(Gran::Character), Forward),
        nav("previousWord", Act::MoveBy(Gran::Word), Backward),
        nav("nextWord", Act::MoveBy(Gran::Word), Forward),
        nav("previousSentence", Act::MoveBy(Gran::Sentence), Backward),
        nav("nextSentence", Act::MoveBy(Gran::Sentence), Forward),
        nav("previousLine", Act::MoveBy(Gran::Line), Backward),
        nav("nextLine", Act::MoveBy(Gran::Line), Forward),
        nav("previousObject", Act::MoveBy(Gran::Object), Backward),
        nav("nextObject", Act::MoveBy(Gran::Object), Forward),
        nav("previousGroup", Act::MoveBy(Gran::Group), Backward),
        nav("nextGroup", Act::MoveBy(Gran::Group), Forward),
        // Edges. Both jumps carry the forward wrap direction; the original
        // behavior is preserved as-is.
        nav("jumpToTop", Act::JumpToTop, Forward),
        nav("jumpToBottom", Act::JumpToBottom, Forward),
        // Reading.
        base("readFromHere", Act::ReadFromHere),
        base("stopSpeech", Act::StopSpeech),
        base("speakCurrentPosition", Act::SpeakPosition),
        base("fullyDescribe", Act::FullyDescribe),
        base("readLinkUrl", Act::ReadLinkUrl),
        base("readCurrentTitle", Act::ReadCurrentTitle),
        // Actions.
        {
            let mut spec = base("actOnCurrentItem", Act::ActOnItem);
            spec.allow_events = true;
            spec
        },
        {
            let mut spec = base("forceClickOnCurrentItem", Act::ForceClick);
            spec.allow_events = true;
            spec
        },
        // Voice properties.
        tts("decreaseTtsRate", TtsProperty::Rate, false),
        tts("increaseTtsRate", TtsProperty::Rate, true),
        tts("decreaseTtsPitch", TtsProperty::Pitch, false),
        tts("increaseTtsPitch", TtsProperty::Pitch, true),
        tts("decreaseTtsVolume", TtsProperty::Volume, false),
        tts("increaseTtsVolume", TtsProperty::Volume, true),
        // Modes and widgets.
        base("toggleStickyMode", Act::ToggleStickyMode),
        {
            let mut spec = base("toggleSearchWidget", Act::ToggleSearchWidget);
            spec.platforms = Some(&[Platform::ChromeOs]);
            spec
        },
        // Tables.
        nav("previousRow", Act::TableMove(-1, 0), Backward),
        nav("nextRow", Act::TableMove(1, 0), Forward),
        nav("previousCol", Act::TableMove(0, -1), Backward),
        nav("nextCol", Act::TableMove(0, 1), Forward),
        nav("goToFirstCell", Act::TableFirstCell, Forward),
        nav("goToLastCell", Act::TableLastCell, Backward),
        base("speakTableLocation", Act::TableLocation),
    ];

    // Find commands, forward and backward for every predicate.
    let finds: &[(&'static str, &'static str, Pred)] = &[
        ("nextHeading", "previousHeading", Pred::Heading(None)),
        ("nextHeading1", "previousHeading1", Pred::Heading(Some(1))),
        ("nextHeading2", "previousHeading2", Pred::Heading(Some(2))),
        ("nextHeading3", "previousHeading3", Pred::Heading(Some(3))),
        ("nextHeading4", "previousHeading4", Pred::Heading(Some(4))),
        ("nextHeading5", "previousHeading5", Pred::Heading(Some(5))),
        ("nextHeading6", "previousHeading6", Pred::Heading(Some(6))),
        ("nextLink", "previousLink", Pred::Link),
        ("nextButton", "previousButton", Pred::Button),
        ("nextCheckbox", "previousCheckbox", Pred::Checkbox),
        ("nextRadio", "previousRadio", Pred::Radio),
        ("nextComboBox", "previousComboBox", Pred::ComboBox),
        ("nextEditText", "previousEditText", Pred::EditText),
        ("nextFormField", "previousFormField", Pred::FormField),
        ("nextGraphic", "previousGraphic", Pred::Graphic),
        ("nextList", "previousList", Pred::List),
        ("nextListItem", "previousListItem", Pred::ListItem),
        ("nextTable", "previousTable", Pred::Table),
        ("nextLandmark", "previousLandmark", Pred::Landmark),
        ("nextSlider", "previousSlider", Pred::Slider),
    ];
    for (next_name, previous_name, predicate) in finds.iter().copied() {
        table.push(find(next_name, predicate, Forward));
        table.push(find(previous_name, predicate, Backward));
    }
    table
}

static COMMANDS: Lazy<HashMap<&'static str, CommandSpec>> = Lazy::new(|| {
    all_commands()
        .into_iter()
        .map(|spec| (spec.name, spec))
        .collect()
});

/// Look up a command by name. Unknown names are a caller bug.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.get(name)
}

/// All command names, for help surfaces and tests.
pub fn command_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMMANDS.keys().copied().collect();
    names.sort_unstable();
    names
}
