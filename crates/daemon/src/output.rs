use brt_config::OutputMode;
use brt_core::{ChangeListener, RuntimeSnapshot};
use brt_indicator::IndicatorView;
use std::io::{self, Write};

/// Writes the indicator to a line-oriented sink (stdout for panels such as
/// waybar or i3blocks). Identical consecutive lines are written once.
pub struct PanelOutput<W> {
    mode: OutputMode,
    out: W,
    last: Option<String>,
}

impl PanelOutput<io::Stdout> {
    pub fn stdout(mode: OutputMode) -> Self {
        Self::new(mode, io::stdout())
    }
}

impl<W: Write + Send> PanelOutput<W> {
    pub fn new(mode: OutputMode, out: W) -> Self {
        Self {
            mode,
            out,
            last: None,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn render(&self, view: &IndicatorView) -> anyhow::Result<Option<String>> {
        Ok(match self.mode {
            OutputMode::Plain => Some(view.label.clone()),
            OutputMode::Json => Some(view.waybar().to_json()?),
            OutputMode::Quiet => None,
        })
    }
}

impl<W: Write + Send> ChangeListener for PanelOutput<W> {
    fn on_change(&mut self, snapshot: &RuntimeSnapshot) -> anyhow::Result<()> {
        let view = IndicatorView::from_snapshot(snapshot);
        tracing::debug!(label = %view.label, icon = view.icon_name, "indicator updated");

        let Some(line) = self.render(&view)? else {
            return Ok(());
        };
        if self.last.as_deref() == Some(line.as_str()) {
            return Ok(());
        }
        writeln!(self.out, "{line}")?;
        self.out.flush()?;
        self.last = Some(line);
        Ok(())
    }
}
