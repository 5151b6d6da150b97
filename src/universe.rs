use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{
    dataset::{StateDataset, scope::PeriodScope},
    error::OrderlensResult,
};

/// BIST100 constituents with the `.E` equity suffix.
const BIST100: [&str; 100] = [
    "AEFES.E", "AGHOL.E", "AKBNK.E", "AKSA.E", "AKSEN.E", "ALARK.E", "ALTNY.E", "ANSGR.E",
    "ARCLK.E", "ASELS.E", "ASTOR.E", "BALSU.E", "BIMAS.E", "BRSAN.E", "BRYAT.E", "BSOKE.E",
    "BTCIM.E", "CANTE.E", "CCOLA.E", "CIMSA.E", "CWENE.E", "DAPGM.E", "DOAS.E", "DOHOL.E",
    "DSTKF.E", "ECILC.E", "EFOR.E", "EGEEN.E", "EKGYO.E", "ENERY.E", "ENJSA.E", "ENKAI.E",
    "EREGL.E", "EUPWR.E", "FENER.E", "FROTO.E", "GARAN.E", "GENIL.E", "GESAN.E", "GLRMK.E",
    "GRSEL.E", "GRTHO.E", "GSRAY.E", "GUBRF.E", "HALKB.E", "HEKTS.E", "ISCTR.E", "ISMEN.E",
    "IZENR.E", "KCAER.E", "KCHOL.E", "KLRHO.E", "KONTR.E", "KRDMD.E", "KTLEV.E", "KUYAS.E",
    "MAGEN.E", "MAVI.E", "MGROS.E", "MIATK.E", "MPARK.E", "OBAMS.E", "ODAS.E", "OTKAR.E",
    "OYAKC.E", "PASEU.E", "PATEK.E", "PETKM.E", "PGSUS.E", "QUAGR.E", "RALYH.E", "REEDR.E",
    "SAHOL.E", "SASA.E", "SISE.E", "SKBNK.E", "SOKM.E", "TABGD.E", "TAVHL.E", "TCELL.E",
    "THYAO.E", "TKFEN.E", "TOASO.E", "TRALT.E", "TRENJ.E", "TRMET.E", "TSKB.E", "TSPOR.E",
    "TTKOM.E", "TTRAK.E", "TUKAS.E", "TUPRS.E", "TUREX.E", "TURSG.E", "ULKER.E", "VAKBN.E",
    "VESTL.E", "YEOTK.E", "YKBNK.E", "ZOREN.E",
];

/// The closed set of instruments the comparison view ranks across.
///
/// Instruments present in the data but outside the universe are excluded
/// from the comparison view; they remain selectable for per-instrument
/// detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Universe {
    tickers: BTreeSet<String>,
}

impl Universe {
    pub fn new<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
        }
    }

    /// The BIST100 reference universe.
    pub fn bist100() -> Self {
        Self::new(BIST100)
    }

    pub fn contains(&self, instrument_id: &str) -> bool {
        self.tickers.contains(instrument_id)
    }

    pub fn len(&self) -> usize {
        self.tickers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickers.is_empty()
    }

    pub fn tickers(&self) -> &BTreeSet<String> {
        &self.tickers
    }

    /// Sorted intersection of the universe with the instruments present in
    /// the dataset. Falls back to every instrument in the data when the
    /// intersection is empty, so a dataset outside the reference universe
    /// still yields a comparison view.
    pub fn available_in(&self, dataset: &StateDataset) -> OrderlensResult<Vec<String>> {
        let present = dataset.instruments()?;
        let available = present
            .iter()
            .filter(|id| self.contains(id))
            .cloned()
            .collect::<Vec<_>>();

        Ok(if available.is_empty() { present } else { available })
    }

    /// Comparison-view scope over the universe's instruments.
    pub fn as_scope(&self) -> PeriodScope {
        PeriodScope::for_instruments(self.tickers.iter().cloned())
    }
}
