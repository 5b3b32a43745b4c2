// MusicXML builder state machine

use super::duration::{beat_unit_name, duration_to_note_type};
use super::helpers::{format_number, xml_escape};
use super::pitch::midi_to_step_alter_octave;
use crate::models::{Clef, Duration, TimeSignature};

/// MusicXML `dynamics` 100 corresponds to this MIDI velocity
const FORTE_VELOCITY: f64 = 90.0;

/// Attributes written at the top of a part's first measure
#[derive(Debug, Clone, Copy)]
pub struct PartAttributes {
    pub clef: Clef,
    pub time_signature: TimeSignature,
    /// Beats per minute in the time signature's beat unit
    pub tempo: f64,
}

/// One `<note>` element
#[derive(Debug, Clone, Copy)]
pub struct NoteSpec {
    pub midi: u8,
    pub duration: Duration,
    /// Append to the previous note as a chord member
    pub chord: bool,
    pub tie_stop: bool,
    pub tie_start: bool,
    pub velocity: u8,
}

/// State machine for building one MusicXML part
pub struct MusicXmlBuilder {
    buffer: String,
    measure_number: usize,
    measure_started: bool,
    attributes_written: bool,
    divisions: u32,
}

impl MusicXmlBuilder {
    /// Create a builder; all durations are written in `1/divisions` quarters
    pub fn new(divisions: u32) -> Self {
        Self {
            buffer: String::new(),
            measure_number: 1,
            measure_started: false,
            attributes_written: false,
            divisions: divisions.max(1),
        }
    }

    fn divs(&self, duration: Duration) -> u32 {
        (duration * self.divisions).to_integer()
    }

    /// Open a measure; the first one also gets the part attributes
    pub fn start_measure(&mut self, attributes: Option<&PartAttributes>) {
        self.buffer.push_str(&format!("    <measure number=\"{}\">\n", self.measure_number));
        self.measure_started = true;

        if let Some(attrs) = attributes {
            if !self.attributes_written {
                self.write_attributes(attrs);
                self.write_tempo(attrs);
                self.attributes_written = true;
            }
        }
    }

    /// Close current measure and increment number
    pub fn end_measure(&mut self) {
        self.buffer.push_str("    </measure>\n");
        self.measure_number += 1;
        self.measure_started = false;
    }

    /// Write a pitched note
    pub fn write_note(&mut self, note: &NoteSpec) {
        let (step, alter, octave) = midi_to_step_alter_octave(note.midi);
        let dynamics = note.velocity as f64 / FORTE_VELOCITY * 100.0;

        self.buffer
            .push_str(&format!("      <note dynamics=\"{}\">\n", format_number(dynamics)));
        if note.chord {
            self.buffer.push_str("        <chord/>\n");
        }
        self.buffer.push_str("        <pitch>\n");
        self.buffer.push_str(&format!("          <step>{}</step>\n", step));
        if alter != 0 {
            self.buffer.push_str(&format!("          <alter>{}</alter>\n", alter));
        }
        self.buffer.push_str(&format!("          <octave>{}</octave>\n", octave));
        self.buffer.push_str("        </pitch>\n");
        self.buffer
            .push_str(&format!("        <duration>{}</duration>\n", self.divs(note.duration)));

        // <tie> comes before <type>; <tied> goes in <notations>
        if note.tie_stop {
            self.buffer.push_str("        <tie type=\"stop\"/>\n");
        }
        if note.tie_start {
            self.buffer.push_str("        <tie type=\"start\"/>\n");
        }

        self.write_type(note.duration);

        if note.tie_stop || note.tie_start {
            self.buffer.push_str("        <notations>\n");
            if note.tie_stop {
                self.buffer.push_str("          <tied type=\"stop\"/>\n");
            }
            if note.tie_start {
                self.buffer.push_str("          <tied type=\"start\"/>\n");
            }
            self.buffer.push_str("        </notations>\n");
        }

        self.buffer.push_str("      </note>\n");
    }

    /// Write a rest of the given length
    pub fn write_rest(&mut self, duration: Duration) {
        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <rest/>\n");
        self.buffer
            .push_str(&format!("        <duration>{}</duration>\n", self.divs(duration)));
        self.write_type(duration);
        self.buffer.push_str("      </note>\n");
    }

    /// Write a rest filling a whole measure
    pub fn write_measure_rest(&mut self, measure_length: Duration) {
        self.buffer.push_str("      <note>\n");
        self.buffer.push_str("        <rest measure=\"yes\"/>\n");
        self.buffer
            .push_str(&format!("        <duration>{}</duration>\n", self.divs(measure_length)));
        self.buffer.push_str("      </note>\n");
    }

    fn write_type(&mut self, duration: Duration) {
        if let Some((note_type, dots)) = duration_to_note_type(duration) {
            self.buffer.push_str(&format!("        <type>{}</type>\n", note_type));
            for _ in 0..dots {
                self.buffer.push_str("        <dot/>\n");
            }
        }
    }

    /// Write MusicXML attributes (divisions, key, time, clef)
    fn write_attributes(&mut self, attrs: &PartAttributes) {
        let (sign, line) = attrs.clef.sign_and_line();
        self.buffer.push_str("      <attributes>\n");
        self.buffer
            .push_str(&format!("        <divisions>{}</divisions>\n", self.divisions));
        self.buffer.push_str("        <key><fifths>0</fifths></key>\n");
        self.buffer.push_str(&format!(
            "        <time><beats>{}</beats><beat-type>{}</beat-type></time>\n",
            attrs.time_signature.beats_per_measure, attrs.time_signature.beat_unit
        ));
        self.buffer.push_str(&format!(
            "        <clef><sign>{}</sign><line>{}</line></clef>\n",
            sign, line
        ));
        self.buffer.push_str("      </attributes>\n");
    }

    /// Metronome mark plus playback tempo (in quarter notes per minute)
    fn write_tempo(&mut self, attrs: &PartAttributes) {
        let quarter_bpm = attrs.tempo * 4.0 / attrs.time_signature.beat_unit.max(1) as f64;
        self.buffer.push_str("      <direction placement=\"above\">\n");
        if let Some(unit) = beat_unit_name(attrs.time_signature.beat_unit) {
            self.buffer.push_str("        <direction-type>\n");
            self.buffer.push_str(&format!(
                "          <metronome><beat-unit>{}</beat-unit><per-minute>{}</per-minute></metronome>\n",
                unit,
                format_number(attrs.tempo)
            ));
            self.buffer.push_str("        </direction-type>\n");
        }
        self.buffer
            .push_str(&format!("        <sound tempo=\"{}\"/>\n", format_number(quarter_bpm)));
        self.buffer.push_str("      </direction>\n");
    }

    /// Wrap the written measures in a `<part>` element
    pub fn finish_part(self, part_id: &str) -> String {
        debug_assert!(!self.measure_started, "part finished inside an open measure");
        format!("  <part id=\"{}\">\n{}  </part>\n", part_id, self.buffer)
    }
}

/// Complete partwise document from `(id, name, part xml)` triples
pub fn assemble_document(title: Option<&str>, parts: &[(String, String, String)]) -> String {
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<!DOCTYPE score-partwise PUBLIC \"-//Recordare//DTD MusicXML 3.1 Partwise//EN\" \"http://www.musicxml.org/dtds/partwise.dtd\">\n");
    xml.push_str("<score-partwise version=\"3.1\">\n");

    if let Some(title) = title {
        if !title.is_empty() {
            xml.push_str("  <movement-title>");
            xml.push_str(&xml_escape(title));
            xml.push_str("</movement-title>\n");
        }
    }

    xml.push_str("  <part-list>\n");
    if parts.len() > 1 {
        xml.push_str("    <part-group type=\"start\" number=\"1\">\n");
        xml.push_str("      <group-symbol>brace</group-symbol>\n");
        xml.push_str("      <group-barline>yes</group-barline>\n");
        xml.push_str("    </part-group>\n");
    }
    for (id, name, _) in parts {
        xml.push_str(&format!("    <score-part id=\"{}\">\n", id));
        xml.push_str(&format!("      <part-name>{}</part-name>\n", xml_escape(name)));
        xml.push_str("    </score-part>\n");
    }
    if parts.len() > 1 {
        xml.push_str("    <part-group type=\"stop\" number=\"1\"/>\n");
    }
    xml.push_str("  </part-list>\n");

    for (_, _, body) in parts {
        xml.push_str(body);
    }
    xml.push_str("</score-partwise>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::duration::quarters;

    fn attrs(clef: Clef) -> PartAttributes {
        PartAttributes { clef, time_signature: TimeSignature::new(4, 4), tempo: 120.0 }
    }

    fn spec(midi: u8, duration: Duration) -> NoteSpec {
        NoteSpec { midi, duration, chord: false, tie_stop: false, tie_start: false, velocity: 90 }
    }

    #[test]
    fn test_builder_new() {
        let builder = MusicXmlBuilder::new(8);
        assert_eq!(builder.measure_number, 1);
        assert!(!builder.measure_started);
        assert!(!builder.attributes_written);
    }

    #[test]
    fn test_attributes_written_once() {
        let mut builder = MusicXmlBuilder::new(2);
        builder.start_measure(Some(&attrs(Clef::Bass)));
        builder.end_measure();
        builder.start_measure(Some(&attrs(Clef::Bass)));
        builder.end_measure();

        assert_eq!(builder.buffer.matches("<attributes>").count(), 1);
        assert!(builder.buffer.contains("<divisions>2</divisions>"));
        assert!(builder.buffer.contains("<clef><sign>F</sign><line>4</line></clef>"));
        assert!(builder.buffer.contains("<time><beats>4</beats><beat-type>4</beat-type></time>"));
        assert!(builder.buffer.contains("<sound tempo=\"120\"/>"));
        assert!(builder.buffer.contains("<measure number=\"2\">"));
    }

    #[test]
    fn test_note_duration_in_divisions() {
        let mut builder = MusicXmlBuilder::new(4);
        builder.start_measure(None);
        builder.write_note(&spec(61, quarters(3, 2)));
        builder.end_measure();

        assert!(builder.buffer.contains("<step>C</step>"));
        assert!(builder.buffer.contains("<alter>1</alter>"));
        assert!(builder.buffer.contains("<duration>6</duration>"));
        assert!(builder.buffer.contains("<type>quarter</type>"));
        assert_eq!(builder.buffer.matches("<dot/>").count(), 1);
        assert!(builder.buffer.contains("dynamics=\"100\""));
    }

    #[test]
    fn test_alter_omitted_for_natural() {
        let mut builder = MusicXmlBuilder::new(1);
        builder.start_measure(None);
        builder.write_note(&spec(60, quarters(1, 1)));
        assert!(!builder.buffer.contains("<alter>"));
    }

    #[test]
    fn test_tie_elements() {
        let mut builder = MusicXmlBuilder::new(1);
        builder.start_measure(None);
        builder.write_note(&NoteSpec { tie_stop: true, tie_start: true, ..spec(60, quarters(4, 1)) });

        let buffer = &builder.buffer;
        let stop = buffer.find("<tie type=\"stop\"/>").unwrap();
        let start = buffer.find("<tie type=\"start\"/>").unwrap();
        let note_type = buffer.find("<type>").unwrap();
        assert!(stop < start && start < note_type, "tie elements precede type");
        assert!(buffer.contains("<tied type=\"stop\"/>"));
        assert!(buffer.contains("<tied type=\"start\"/>"));
    }

    #[test]
    fn test_unknown_duration_has_no_type() {
        let mut builder = MusicXmlBuilder::new(8);
        builder.start_measure(None);
        builder.write_rest(quarters(5, 8));
        assert!(builder.buffer.contains("<duration>5</duration>"));
        assert!(!builder.buffer.contains("<type>"));
    }

    #[test]
    fn test_measure_rest() {
        let mut builder = MusicXmlBuilder::new(1);
        builder.start_measure(None);
        builder.write_measure_rest(quarters(3, 1));
        assert!(builder.buffer.contains("<rest measure=\"yes\"/>"));
        assert!(builder.buffer.contains("<duration>3</duration>"));
    }

    #[test]
    fn test_document_structure() {
        let mut builder = MusicXmlBuilder::new(1);
        builder.start_measure(Some(&attrs(Clef::Treble)));
        builder.end_measure();
        let part = builder.finish_part("P1");
        let xml = assemble_document(Some("Etude <1>"), &[("P1".into(), "Treble".into(), part)]);

        assert!(xml.contains("<?xml version=\"1.0\""));
        assert!(xml.contains("<!DOCTYPE score-partwise"));
        assert!(xml.contains("<score-partwise version=\"3.1\">"));
        assert!(xml.contains("<movement-title>Etude &lt;1&gt;</movement-title>"));
        assert!(xml.contains("<part id=\"P1\">"));
        assert!(!xml.contains("<part-group"));
        assert!(xml.ends_with("</score-partwise>\n"));
    }
}
