//! Serde report contracts.
//!
//! Field names mirror the JSON shapes the dashboard front-end already
//! consumes (Portuguese keys), so the engine output is drop-in for existing
//! clients. Two envelopes exist: the bounded period report and the live
//! daily report; both always carry a `status` field.

use crate::domain::Decimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Terminal status of a report computation.
///
/// `SemDados` is a valid empty result, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    Sucesso,
    SemDados,
    Erro,
}

/// Average order value, per order and per unit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TicketMedio {
    pub pedido: Decimal,
    pub unidade: Decimal,
}

/// Cost totals over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Custos {
    pub custo_total: Decimal,
    pub frete_total: Decimal,
    pub impostos_total: Decimal,
}

/// Derived profitability ratios over a window.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Indices {
    /// Net profit over revenue, as a percentage (0 when revenue is 0).
    pub rentabilidade_media: Decimal,
    /// Mean of the per-order profitability field.
    pub profitabilidade_media: Decimal,
}

/// KPI aggregate for the whole period.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpisGerais {
    pub faturamento_total: Decimal,
    pub lucro_bruto_total: Decimal,
    pub lucro_liquido_total: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
    pub ticket_medio: TicketMedio,
    pub custos: Custos,
    pub indices: Indices,
    /// SKUs that fell into the "Sem nicho" bucket, sorted and deduped.
    pub skus_sem_nicho: Vec<String>,
}

/// Per-day summary inside the period report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResumoDia {
    pub faturamento: Decimal,
    pub lucro_bruto: Decimal,
    pub lucro_liquido: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
    pub ticket_medio: TicketMedio,
}

/// Niche breakdown nested inside one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NichoDoDia {
    pub nicho: String,
    pub faturamento: Decimal,
    pub lucro_bruto: Decimal,
    pub lucro_liquido: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
}

/// One calendar day of the period report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelatorioDia {
    pub data: NaiveDate,
    pub resumo: ResumoDia,
    pub nichos: Vec<NichoDoDia>,
}

/// Whole-period rollup for one niche.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnaliseNicho {
    pub nicho: String,
    pub lucro_liquido: Decimal,
    pub lucro_bruto: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
    pub faturamento_total: Decimal,
    pub frete_total: Decimal,
    pub impostos_total: Decimal,
    pub custo_total: Decimal,
    pub rentabilidade_media: Decimal,
    pub profitabilidade_media: Decimal,
    /// Share of total revenue (ratio, 0 when total revenue is 0).
    pub participacao_faturamento: Decimal,
    /// Share of total net profit (ratio, 0 when total profit is 0).
    pub participacao_lucro: Decimal,
    pub media_dia_valor: Decimal,
    pub media_dia_unidades: Decimal,
}

/// Whole-period rollup for one SKU, with its resolved niche attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnaliseSku {
    pub sku: String,
    pub nicho: String,
    pub lucro_liquido: Decimal,
    pub lucro_bruto: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
    pub faturamento_total: Decimal,
}

/// Hour-of-day bucket (0-23) summed across the whole range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PorHora {
    pub hora: u32,
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_pedidos: u64,
}

/// Weekday bucket (0 = Monday .. 6 = Sunday) summed across the whole range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PorDiaSemana {
    pub dia_semana: u32,
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_pedidos: u64,
}

/// Order line projection for lists (`pedidos_lista`, last sales).
///
/// Carries the upstream-persisted `profit` as display data; recomputed
/// figures live in the aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PedidoResumo {
    pub payment_date: NaiveDateTime,
    pub order_id: String,
    pub cart_id: String,
    pub sku: String,
    pub title: String,
    pub quantity: u32,
    pub total_value: Decimal,
    pub profit: Decimal,
    pub nicho: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hora: Option<u32>,
}

/// Rank movement relative to the immediately preceding published snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movimento {
    Novo,
    Subiu,
    Desceu,
    Estavel,
}

/// One ranking row: dimension key (SKU, ad or niche) plus profit figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub chave: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nicho: Option<String>,
    pub lucro_liquido: Decimal,
    pub lucro_bruto: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub movimento: Option<Movimento>,
}

/// Period-report rankings block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Rankings {
    pub top_skus: Vec<RankingEntry>,
    pub top_ads: Vec<RankingEntry>,
    pub top_por_nicho: Vec<RankingEntry>,
    pub top_skus_per_nicho: BTreeMap<String, Vec<RankingEntry>>,
}

/// One forward-looking forecast point.
///
/// `lucro_previsto` is derived only from days strictly before `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub data: NaiveDate,
    pub lucro_realizado: Decimal,
    pub lucro_previsto: Decimal,
}

/// Closed date range of a period report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Periodo {
    pub inicio: NaiveDate,
    pub fim: NaiveDate,
    pub dias_totais: i64,
}

/// Grouped breakdowns block of the period report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relatorios {
    pub diario: Vec<RelatorioDia>,
    pub por_nicho: Vec<AnaliseNicho>,
    pub por_sku: Vec<AnaliseSku>,
    pub por_hora: Vec<PorHora>,
    pub por_dia_semana: Vec<PorDiaSemana>,
    pub pedidos_lista: Vec<PedidoResumo>,
}

/// Bounded "flexible period" report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodReport {
    pub periodo: Periodo,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
    pub kpis_gerais: KpisGerais,
    pub relatorios: Relatorios,
    pub rankings: Rankings,
    pub previsao: Vec<ForecastPoint>,
}

/// Daily KPI block of the live report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KpisDiarios {
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_pedidos: u64,
    pub total_unidades: u64,
    pub ticket_medio: TicketMedio,
    pub custos: Custos,
}

/// Per-niche slice of the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnaliseNichoDia {
    pub nicho: String,
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_pedidos: u64,
}

/// Live daily rankings with movement classification.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankingsDiarios {
    pub top_nichos: Vec<RankingEntry>,
    pub top_skus: Vec<RankingEntry>,
    pub top_ads: Vec<RankingEntry>,
}

/// Best-selling product of the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelhorProduto {
    pub sku: String,
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_unidades: u64,
}

/// Best-performing advertisement of the current day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MelhorAnuncio {
    pub ad: String,
    pub lucro_liquido: Decimal,
    pub faturamento: Decimal,
    pub total_unidades: u64,
}

/// Continuously-updated snapshot of the current calendar day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveDailyReport {
    pub dia: NaiveDate,
    pub status: ReportStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub erro: Option<String>,
    pub kpis_diarios: KpisDiarios,
    pub analise_por_nicho_dia: Vec<AnaliseNichoDia>,
    pub por_sku_dia: Vec<AnaliseSku>,
    pub por_hora: Vec<PorHora>,
    pub rankings_diarios: RankingsDiarios,
    pub ultima_venda: Option<PedidoResumo>,
    pub melhor_produto: Option<MelhorProduto>,
    pub melhor_anuncio: Option<MelhorAnuncio>,
    pub ultimas_15_vendas: Vec<PedidoResumo>,
    pub vendas_negativas: Vec<PedidoResumo>,
    pub timestamp_atualizacao: NaiveDateTime,
}

impl LiveDailyReport {
    /// Empty report for a day with no orders yet.
    pub fn sem_dados(dia: NaiveDate, now: NaiveDateTime) -> Self {
        LiveDailyReport {
            dia,
            status: ReportStatus::SemDados,
            erro: None,
            kpis_diarios: KpisDiarios::default(),
            analise_por_nicho_dia: Vec::new(),
            por_sku_dia: Vec::new(),
            por_hora: Vec::new(),
            rankings_diarios: RankingsDiarios::default(),
            ultima_venda: None,
            melhor_produto: None,
            melhor_anuncio: None,
            ultimas_15_vendas: Vec::new(),
            vendas_negativas: Vec::new(),
            timestamp_atualizacao: now,
        }
    }

    /// Error envelope still shaped like a valid report.
    pub fn erro(dia: NaiveDate, now: NaiveDateTime, message: impl Into<String>) -> Self {
        let mut report = Self::sem_dados(dia, now);
        report.status = ReportStatus::Erro;
        report.erro = Some(message.into());
        report
    }
}

impl PeriodReport {
    /// Error envelope still shaped like a valid period report.
    pub fn erro(inicio: NaiveDate, fim: NaiveDate, message: impl Into<String>) -> Self {
        PeriodReport {
            periodo: Periodo {
                inicio,
                fim,
                dias_totais: (fim - inicio).num_days() + 1,
            },
            status: ReportStatus::Erro,
            erro: Some(message.into()),
            kpis_gerais: KpisGerais::default(),
            relatorios: Relatorios::default(),
            rankings: Rankings::default(),
            previsao: Vec::new(),
        }
    }
}

/// WebSocket push envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PushMessage {
    pub tipo: String,
    pub dados: LiveDailyReport,
}

impl PushMessage {
    pub const TIPO_INICIAL: &'static str = "relatorio_diario_inicial";
    pub const TIPO_ATUALIZACAO: &'static str = "relatorio_diario";

    pub fn inicial(dados: LiveDailyReport) -> Self {
        PushMessage {
            tipo: Self::TIPO_INICIAL.to_string(),
            dados,
        }
    }

    pub fn atualizacao(dados: LiveDailyReport) -> Self {
        PushMessage {
            tipo: Self::TIPO_ATUALIZACAO.to_string(),
            dados,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&ReportStatus::SemDados).unwrap(),
            "\"sem_dados\""
        );
        assert_eq!(
            serde_json::to_string(&ReportStatus::Sucesso).unwrap(),
            "\"sucesso\""
        );
        assert_eq!(
            serde_json::to_string(&ReportStatus::Erro).unwrap(),
            "\"erro\""
        );
    }

    #[test]
    fn test_movimento_serialization() {
        assert_eq!(serde_json::to_string(&Movimento::Novo).unwrap(), "\"novo\"");
        assert_eq!(
            serde_json::to_string(&Movimento::Estavel).unwrap(),
            "\"estavel\""
        );
    }

    #[test]
    fn test_erro_report_is_well_formed() {
        let dia = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let now = dia.and_hms_opt(12, 0, 0).unwrap();
        let report = LiveDailyReport::erro(dia, now, "store unreachable");
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "erro");
        assert_eq!(json["erro"], "store unreachable");
        assert!(json["kpis_diarios"].is_object());
    }

    #[test]
    fn test_push_message_types() {
        let dia = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let now = dia.and_hms_opt(0, 0, 0).unwrap();
        let msg = PushMessage::inicial(LiveDailyReport::sem_dados(dia, now));
        assert_eq!(msg.tipo, "relatorio_diario_inicial");
        let msg = PushMessage::atualizacao(LiveDailyReport::sem_dados(dia, now));
        assert_eq!(msg.tipo, "relatorio_diario");
    }

    #[test]
    fn test_ranking_entry_omits_empty_movement() {
        let entry = RankingEntry {
            chave: "SKU-1".to_string(),
            nicho: None,
            lucro_liquido: Decimal::from_i64(10),
            lucro_bruto: Decimal::from_i64(12),
            movimento: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("movimento").is_none());
        assert!(json.get("nicho").is_none());
    }
}
