//! Teleprompter script handling.
//!
//! A script is markdown-ish text; only ```speech fenced blocks are spoken.
//! When the text has no such blocks the whole text is the script.

/// Extract the spoken portions of a script. Fenced blocks opened with
/// ```` ```speech ```` are concatenated (blank line between blocks); a
/// script without any speech fence is returned whole, trimmed.
pub fn speech_text(script: &str) -> String {
    let mut blocks: Vec<&str> = Vec::new();
    let mut in_speech = false;
    let mut start = 0usize;
    let mut offset = 0usize;

    for line in script.split_inclusive('\n') {
        let trimmed = line.trim_end_matches(['\n', '\r']).trim();
        if in_speech {
            if trimmed == "```" {
                blocks.push(script[start..offset].trim_end_matches(['\n', '\r']));
                in_speech = false;
            }
        } else if trimmed == "```speech" {
            in_speech = true;
            start = offset + line.len();
        }
        offset += line.len();
    }
    // An unterminated fence runs to the end of the text.
    if in_speech {
        blocks.push(script[start..].trim_end_matches(['\n', '\r']));
    }

    if blocks.is_empty() {
        script.trim().to_string()
    } else {
        blocks.join("\n\n")
    }
}

/// Scroll offset for the prompter view. Wheel deltas are scaled by the
/// configured sensitivity and applied directly, no smoothing or snapping;
/// input is ignored outside capture mode.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ScrollState {
    offset: f64,
}

impl ScrollState {
    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn wheel(&mut self, delta: f64, sensitivity: f64, capturing: bool) {
        if !capturing {
            return;
        }
        self.offset = (self.offset + delta * sensitivity).max(0.0);
    }

    pub fn reset(&mut self) {
        self.offset = 0.0;
    }
}
