//! Incrementally maintained aggregate for the current calendar day.
//!
//! The tracker folds newly ingested orders into running sums instead of
//! rescanning the historical store, detects the local-midnight rollover
//! lazily, and classifies ranking movement against the immediately
//! preceding published snapshot. Ingestion is serialized behind one mutex;
//! snapshot construction happens under the same mutex so readers never
//! observe a partially-folded aggregate.

use crate::domain::{Decimal, NicheMap, Nicho, Order, Sku};
use crate::engine::aggregate::{
    pedido_resumo, sort_ranking, LAST_SALES_LIMIT, TOP_ADS_LIMIT, TOP_NICHOS_LIMIT, TOP_SKUS_LIMIT,
};
use crate::report::shapes::{
    AnaliseNichoDia, AnaliseSku, Custos, KpisDiarios, LiveDailyReport, MelhorAnuncio,
    MelhorProduto, Movimento, PedidoResumo, PorHora, RankingEntry, RankingsDiarios, ReportStatus,
    TicketMedio,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Source of "now" in the store's local timezone.
///
/// Injected so rollover behavior is testable without waiting for midnight.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> NaiveDateTime;
}

/// Wall clock shifted by a fixed UTC offset (e.g. -3 for America/Sao_Paulo).
#[derive(Debug, Clone)]
pub struct OffsetClock {
    offset_hours: i32,
}

impl OffsetClock {
    pub fn new(offset_hours: i32) -> Self {
        Self { offset_hours }
    }
}

impl Clock for OffsetClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc() + Duration::hours(i64::from(self.offset_hours))
    }
}

/// Manually advanced clock for tests.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<NaiveDateTime>,
}

impl ManualClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.lock().expect("clock lock poisoned") = now;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.lock().expect("clock lock poisoned")
    }
}

/// Result of one `ingest` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Folded into the running aggregate.
    Accepted,
    /// Order key already seen today; snapshots reprocessed from the store
    /// are idempotent.
    Duplicate,
    /// Payment date before the tracked day; never merged across midnight.
    Stale,
}

#[derive(Debug, Clone, Default)]
struct LiveAcc {
    faturamento: Decimal,
    lucro_bruto: Decimal,
    lucro_liquido: Decimal,
    pedidos: u64,
    unidades: u64,
}

impl LiveAcc {
    fn fold(&mut self, order: &Order) {
        self.faturamento += order.total_value;
        self.lucro_bruto += order.gross_profit;
        self.lucro_liquido += order.net_profit();
        self.pedidos += 1;
        self.unidades += u64::from(order.quantity);
    }
}

#[derive(Debug)]
struct TrackerState {
    dia: NaiveDate,
    map: NicheMap,
    vistos: HashSet<String>,
    total: LiveAcc,
    custos: Custos,
    por_nicho: BTreeMap<Nicho, LiveAcc>,
    por_sku: BTreeMap<Sku, (Nicho, LiveAcc)>,
    por_ad: BTreeMap<String, LiveAcc>,
    por_hora: BTreeMap<u32, LiveAcc>,
    /// (payment_date, order_key, resumo, lucro_liquido) per accepted order.
    vendas: Vec<(NaiveDateTime, String, PedidoResumo, Decimal)>,
    /// Ranking key order of the previous published snapshot.
    prev_nichos: Vec<String>,
    prev_skus: Vec<String>,
    prev_ads: Vec<String>,
    version: u64,
}

impl TrackerState {
    fn fresh(dia: NaiveDate, map: NicheMap) -> Self {
        Self {
            dia,
            map,
            vistos: HashSet::new(),
            total: LiveAcc::default(),
            custos: Custos::default(),
            por_nicho: BTreeMap::new(),
            por_sku: BTreeMap::new(),
            por_ad: BTreeMap::new(),
            por_hora: BTreeMap::new(),
            vendas: Vec::new(),
            prev_nichos: Vec::new(),
            prev_skus: Vec::new(),
            prev_ads: Vec::new(),
            version: 0,
        }
    }

    fn rollover_if_needed(&mut self, hoje: NaiveDate) {
        if self.dia != hoje {
            info!(de = %self.dia, para = %hoje, "virada de dia: descartando snapshot anterior");
            let map = self.map.clone();
            // A rollover is itself a state change worth publishing, so the
            // counter keeps climbing across days instead of resetting.
            let version = self.version + 1;
            *self = TrackerState::fresh(hoje, map);
            self.version = version;
        }
    }
}

/// Live tracker for "today's" daily snapshot.
pub struct LiveDailyTracker {
    clock: Arc<dyn Clock>,
    state: Mutex<TrackerState>,
}

impl LiveDailyTracker {
    pub fn new(clock: Arc<dyn Clock>, map: NicheMap) -> Self {
        let hoje = clock.now().date();
        Self {
            clock,
            state: Mutex::new(TrackerState::fresh(hoje, map)),
        }
    }

    /// Swap in a refreshed SKU → niche mapping for subsequent folds.
    pub fn set_niche_map(&self, map: NicheMap) {
        let mut state = self.lock();
        state.map = map;
    }

    /// Monotonic change counter; bumps on every accepted ingest and on
    /// rollover. Lets the refresher publish only when something changed.
    /// Reading it observes the clock so a quiet midnight still counts.
    pub fn version(&self) -> u64 {
        let hoje = self.clock.now().date();
        let mut state = self.lock();
        state.rollover_if_needed(hoje);
        state.version
    }

    /// Fold one order into the running aggregate, in O(1) amortized.
    pub fn ingest(&self, order: &Order) -> IngestOutcome {
        let hoje = self.clock.now().date();
        let mut state = self.lock();
        state.rollover_if_needed(hoje);

        let dia_pedido = order.payment_date.date();
        if dia_pedido != state.dia {
            warn!(
                pedido = %order.order_key(),
                dia_pedido = %dia_pedido,
                dia_rastreado = %state.dia,
                "pedido fora do dia rastreado ignorado"
            );
            return IngestOutcome::Stale;
        }

        let chave = order.order_key();
        if !state.vistos.insert(chave.clone()) {
            debug!(pedido = %chave, "pedido duplicado ignorado");
            return IngestOutcome::Duplicate;
        }

        let nicho = state.map.resolve(order);
        state.total.fold(order);
        state.custos.custo_total += order.cost;
        state.custos.frete_total += order.freight;
        state.custos.impostos_total += order.taxes;
        state.por_nicho.entry(nicho.clone()).or_default().fold(order);
        let sku_bucket = state
            .por_sku
            .entry(order.sku.clone())
            .or_insert_with(|| (nicho.clone(), LiveAcc::default()));
        if nicho < sku_bucket.0 {
            sku_bucket.0 = nicho;
        }
        sku_bucket.1.fold(order);
        state
            .por_ad
            .entry(order.ad.as_str().to_string())
            .or_default()
            .fold(order);
        state
            .por_hora
            .entry(chrono::Timelike::hour(&order.payment_date))
            .or_default()
            .fold(order);

        let resumo = pedido_resumo(order, &state.map, false);
        state
            .vendas
            .push((order.payment_date, chave, resumo, order.net_profit()));

        state.version += 1;
        IngestOutcome::Accepted
    }

    /// Fold a batch; returns the number of accepted orders.
    ///
    /// Ingesting N orders one at a time and ingesting the same N in one
    /// batch produce identical snapshots.
    pub fn ingest_batch(&self, orders: &[Order]) -> usize {
        orders
            .iter()
            .filter(|o| self.ingest(o) == IngestOutcome::Accepted)
            .count()
    }

    /// Build and publish the current snapshot.
    ///
    /// Movement classification compares against the ranking order of the
    /// immediately preceding call, then records this publish as the new
    /// reference. The returned report is immutable; callers share it by
    /// cloning the `Arc`.
    pub fn current_snapshot(&self) -> Arc<LiveDailyReport> {
        let agora = self.clock.now();
        let mut state = self.lock();
        state.rollover_if_needed(agora.date());

        if state.total.pedidos == 0 {
            state.prev_nichos.clear();
            state.prev_skus.clear();
            state.prev_ads.clear();
            return Arc::new(LiveDailyReport::sem_dados(state.dia, agora));
        }

        let kpis_diarios = KpisDiarios {
            lucro_liquido: state.total.lucro_liquido,
            faturamento: state.total.faturamento,
            total_pedidos: state.total.pedidos,
            total_unidades: state.total.unidades,
            ticket_medio: TicketMedio {
                pedido: state
                    .total
                    .faturamento
                    .div_or_zero(Decimal::from_i64(state.total.pedidos as i64)),
                unidade: state
                    .total
                    .faturamento
                    .div_or_zero(Decimal::from_i64(state.total.unidades as i64)),
            },
            custos: state.custos.clone(),
        };

        let analise_por_nicho_dia = state
            .por_nicho
            .iter()
            .map(|(nicho, acc)| AnaliseNichoDia {
                nicho: nicho.as_str().to_string(),
                lucro_liquido: acc.lucro_liquido,
                faturamento: acc.faturamento,
                total_pedidos: acc.pedidos,
            })
            .collect();

        let por_sku_dia = state
            .por_sku
            .iter()
            .map(|(sku, (nicho, acc))| AnaliseSku {
                sku: sku.as_str().to_string(),
                nicho: nicho.as_str().to_string(),
                lucro_liquido: acc.lucro_liquido,
                lucro_bruto: acc.lucro_bruto,
                total_pedidos: acc.pedidos,
                total_unidades: acc.unidades,
                faturamento_total: acc.faturamento,
            })
            .collect();

        let por_hora = state
            .por_hora
            .iter()
            .map(|(hora, acc)| PorHora {
                hora: *hora,
                lucro_liquido: acc.lucro_liquido,
                faturamento: acc.faturamento,
                total_pedidos: acc.pedidos,
            })
            .collect();

        let mut top_nichos: Vec<RankingEntry> = state
            .por_nicho
            .iter()
            .map(|(nicho, acc)| RankingEntry {
                chave: nicho.as_str().to_string(),
                nicho: None,
                lucro_liquido: acc.lucro_liquido,
                lucro_bruto: acc.lucro_bruto,
                movimento: None,
            })
            .collect();
        sort_ranking(&mut top_nichos);
        top_nichos.truncate(TOP_NICHOS_LIMIT);

        let mut top_skus: Vec<RankingEntry> = state
            .por_sku
            .iter()
            .map(|(sku, (nicho, acc))| RankingEntry {
                chave: sku.as_str().to_string(),
                nicho: Some(nicho.as_str().to_string()),
                lucro_liquido: acc.lucro_liquido,
                lucro_bruto: acc.lucro_bruto,
                movimento: None,
            })
            .collect();
        sort_ranking(&mut top_skus);
        top_skus.truncate(TOP_SKUS_LIMIT);

        let mut top_ads: Vec<RankingEntry> = state
            .por_ad
            .iter()
            .map(|(ad, acc)| RankingEntry {
                chave: ad.clone(),
                nicho: None,
                lucro_liquido: acc.lucro_liquido,
                lucro_bruto: acc.lucro_bruto,
                movimento: None,
            })
            .collect();
        sort_ranking(&mut top_ads);
        top_ads.truncate(TOP_ADS_LIMIT);

        classify_movement(&state.prev_nichos, &mut top_nichos);
        classify_movement(&state.prev_skus, &mut top_skus);
        classify_movement(&state.prev_ads, &mut top_ads);

        state.prev_nichos = top_nichos.iter().map(|e| e.chave.clone()).collect();
        state.prev_skus = top_skus.iter().map(|e| e.chave.clone()).collect();
        state.prev_ads = top_ads.iter().map(|e| e.chave.clone()).collect();

        let melhor_produto = top_skus.first().map(|entry| {
            let (_, acc) = &state.por_sku[&Sku::new(entry.chave.clone())];
            MelhorProduto {
                sku: entry.chave.clone(),
                lucro_liquido: acc.lucro_liquido,
                faturamento: acc.faturamento,
                total_unidades: acc.unidades,
            }
        });

        let melhor_anuncio = top_ads.first().map(|entry| {
            let acc = &state.por_ad[&entry.chave];
            MelhorAnuncio {
                ad: entry.chave.clone(),
                lucro_liquido: acc.lucro_liquido,
                faturamento: acc.faturamento,
                total_unidades: acc.unidades,
            }
        });

        // Newest first, order key as deterministic tie-break.
        let mut vendas: Vec<&(NaiveDateTime, String, PedidoResumo, Decimal)> =
            state.vendas.iter().collect();
        vendas.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let ultima_venda = vendas.first().map(|(_, _, resumo, _)| resumo.clone());
        let ultimas_15_vendas = vendas
            .iter()
            .take(LAST_SALES_LIMIT)
            .map(|(_, _, resumo, _)| resumo.clone())
            .collect();
        let vendas_negativas = vendas
            .iter()
            .filter(|(_, _, _, lucro)| lucro.is_negative())
            .map(|(_, _, resumo, _)| resumo.clone())
            .collect();

        Arc::new(LiveDailyReport {
            dia: state.dia,
            status: ReportStatus::Sucesso,
            erro: None,
            kpis_diarios,
            analise_por_nicho_dia,
            por_sku_dia,
            por_hora,
            rankings_diarios: RankingsDiarios {
                top_nichos,
                top_skus,
                top_ads,
            },
            ultima_venda,
            melhor_produto,
            melhor_anuncio,
            ultimas_15_vendas,
            vendas_negativas,
            timestamp_atualizacao: agora,
        })
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, TrackerState> {
        self.state.lock().expect("tracker lock poisoned")
    }
}

impl fmt::Debug for LiveDailyTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveDailyTracker").finish_non_exhaustive()
    }
}

/// Classify each entry's movement relative to the previous published key
/// order: absent key is `novo`, lower index is `subiu`, higher is `desceu`,
/// same index is `estavel`.
fn classify_movement(previous: &[String], current: &mut [RankingEntry]) {
    for (idx, entry) in current.iter_mut().enumerate() {
        entry.movimento = Some(match previous.iter().position(|k| k == &entry.chave) {
            None => Movimento::Novo,
            Some(prev_idx) if idx < prev_idx => Movimento::Subiu,
            Some(prev_idx) if idx > prev_idx => Movimento::Desceu,
            Some(_) => Movimento::Estavel,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AdId;

    fn clock_at(s: &str) -> Arc<ManualClock> {
        Arc::new(ManualClock::new(s.parse().unwrap()))
    }

    fn order(order_id: &str, sku: &str, gross: &str, date_time: &str) -> Order {
        Order {
            order_id: order_id.to_string(),
            cart_id: "C-1".to_string(),
            ad: AdId::new("AD-1"),
            sku: Sku::new(sku),
            title: format!("Produto {}", sku),
            quantity: 2,
            total_value: Decimal::from_i64(100),
            payment_date: date_time.parse().unwrap(),
            status: "pago".to_string(),
            cost: Decimal::from_i64(30),
            gross_profit: Decimal::from_str_canonical(gross).unwrap(),
            taxes: Decimal::from_i64(1),
            freight: Decimal::from_i64(2),
            committee: Decimal::from_i64(3),
            fraction: Decimal::from_i64(1),
            profitability: Decimal::zero(),
            rentability: Decimal::zero(),
            store: "loja".to_string(),
            profit: Decimal::zero(),
            nicho: Some(Nicho::new("calcados")),
        }
    }

    #[test]
    fn test_empty_day_is_sem_dados() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T08:00:00"), NicheMap::new());
        let snap = tracker.current_snapshot();
        assert_eq!(snap.status, ReportStatus::SemDados);
        assert!(snap.ultima_venda.is_none());
        assert!(snap.melhor_produto.is_none());
        assert!(snap.melhor_anuncio.is_none());
    }

    #[test]
    fn test_ingest_folds_running_sums() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T08:00:00"), NicheMap::new());
        assert_eq!(
            tracker.ingest(&order("O-1", "A", "16", "2024-01-01T07:30:00")),
            IngestOutcome::Accepted
        );
        let snap = tracker.current_snapshot();
        assert_eq!(snap.status, ReportStatus::Sucesso);
        assert_eq!(snap.kpis_diarios.total_pedidos, 1);
        assert_eq!(snap.kpis_diarios.total_unidades, 2);
        // net = 16 - 1 - 2 - 3
        assert_eq!(snap.kpis_diarios.lucro_liquido, Decimal::from_i64(10));
        assert_eq!(snap.kpis_diarios.custos.custo_total, Decimal::from_i64(30));
    }

    #[test]
    fn test_duplicate_order_key_is_noop() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T08:00:00"), NicheMap::new());
        let pedido = order("O-1", "A", "16", "2024-01-01T07:30:00");
        assert_eq!(tracker.ingest(&pedido), IngestOutcome::Accepted);
        assert_eq!(tracker.ingest(&pedido), IngestOutcome::Duplicate);
        assert_eq!(tracker.current_snapshot().kpis_diarios.total_pedidos, 1);
    }

    #[test]
    fn test_incremental_matches_batch() {
        let orders: Vec<Order> = (0..10)
            .map(|i| {
                order(
                    &format!("O-{}", i),
                    if i % 2 == 0 { "A" } else { "B" },
                    &format!("{}", 10 + i),
                    &format!("2024-01-01T0{}:15:00", i % 9),
                )
            })
            .collect();

        let um_a_um = LiveDailyTracker::new(clock_at("2024-01-01T12:00:00"), NicheMap::new());
        for o in &orders {
            um_a_um.ingest(o);
        }

        let em_lote = LiveDailyTracker::new(clock_at("2024-01-01T12:00:00"), NicheMap::new());
        assert_eq!(em_lote.ingest_batch(&orders), 10);

        assert_eq!(
            serde_json::to_value(&*um_a_um.current_snapshot()).unwrap(),
            serde_json::to_value(&*em_lote.current_snapshot()).unwrap()
        );
    }

    #[test]
    fn test_midnight_rollover_discards_old_day() {
        let clock = clock_at("2024-01-01T23:00:00");
        let tracker = LiveDailyTracker::new(clock.clone(), NicheMap::new());
        tracker.ingest(&order("O-1", "A", "16", "2024-01-01T22:30:00"));
        assert_eq!(tracker.current_snapshot().kpis_diarios.total_pedidos, 1);

        clock.set("2024-01-02T00:05:00".parse().unwrap());
        let snap = tracker.current_snapshot();
        assert_eq!(snap.dia, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(snap.status, ReportStatus::SemDados);
        assert_eq!(snap.kpis_diarios.total_pedidos, 0);

        // Orders from the previous day are never merged in.
        assert_eq!(
            tracker.ingest(&order("O-2", "A", "16", "2024-01-01T23:59:00")),
            IngestOutcome::Stale
        );
    }

    #[test]
    fn test_change_detection_scenario() {
        // Previous top-3 [A, B, C]; new top-3 [B, A, D] must classify
        // A down, B up, D new (C dropped out).
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T08:00:00"), NicheMap::new());
        tracker.ingest(&order("O-1", "A", "30", "2024-01-01T07:00:00"));
        tracker.ingest(&order("O-2", "B", "20", "2024-01-01T07:01:00"));
        tracker.ingest(&order("O-3", "C", "10", "2024-01-01T07:02:00"));
        let snap = tracker.current_snapshot();
        let chaves: Vec<&str> = snap
            .rankings_diarios
            .top_skus
            .iter()
            .map(|e| e.chave.as_str())
            .collect();
        assert_eq!(chaves, vec!["A", "B", "C"]);

        // B overtakes A, D overtakes C.
        tracker.ingest(&order("O-4", "B", "25", "2024-01-01T07:10:00"));
        tracker.ingest(&order("O-5", "D", "14", "2024-01-01T07:11:00"));
        let snap = tracker.current_snapshot();
        let top: Vec<(&str, Movimento)> = snap
            .rankings_diarios
            .top_skus
            .iter()
            .map(|e| (e.chave.as_str(), e.movimento.unwrap()))
            .collect();
        assert_eq!(
            top,
            vec![
                ("B", Movimento::Subiu),
                ("A", Movimento::Desceu),
                ("D", Movimento::Novo),
                ("C", Movimento::Desceu),
            ]
        );
    }

    #[test]
    fn test_movement_is_relative_to_previous_publish_not_first() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T08:00:00"), NicheMap::new());
        tracker.ingest(&order("O-1", "A", "30", "2024-01-01T07:00:00"));
        tracker.current_snapshot();
        // Second publish with no changes: everything stable.
        let snap = tracker.current_snapshot();
        assert_eq!(
            snap.rankings_diarios.top_skus[0].movimento,
            Some(Movimento::Estavel)
        );
    }

    #[test]
    fn test_last_sale_and_best_product() {
        let map = NicheMap::from_entries([(Sku::new("B"), Nicho::new("roupas"))]);
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T12:00:00"), map);
        tracker.ingest(&order("O-1", "A", "30", "2024-01-01T09:00:00"));
        tracker.ingest(&order("O-2", "B", "10", "2024-01-01T11:00:00"));

        let snap = tracker.current_snapshot();
        assert_eq!(snap.ultima_venda.as_ref().unwrap().order_id, "O-2");
        assert_eq!(snap.melhor_produto.as_ref().unwrap().sku, "A");
        assert_eq!(snap.ultimas_15_vendas.len(), 2);
        assert_eq!(snap.ultimas_15_vendas[0].order_id, "O-2");
    }

    #[test]
    fn test_negative_sales_listed_by_recomputed_profit() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T12:00:00"), NicheMap::new());
        // gross 4 - 1 - 2 - 3 = net -2
        tracker.ingest(&order("O-1", "A", "4", "2024-01-01T09:00:00"));
        tracker.ingest(&order("O-2", "B", "30", "2024-01-01T10:00:00"));
        let snap = tracker.current_snapshot();
        assert_eq!(snap.vendas_negativas.len(), 1);
        assert_eq!(snap.vendas_negativas[0].order_id, "O-1");
    }

    #[test]
    fn test_rollover_bumps_version() {
        let clock = clock_at("2024-01-01T23:00:00");
        let tracker = LiveDailyTracker::new(clock.clone(), NicheMap::new());
        tracker.ingest(&order("O-1", "A", "16", "2024-01-01T22:30:00"));
        let antes = tracker.version();

        clock.set("2024-01-02T00:05:00".parse().unwrap());
        assert!(tracker.version() > antes);
    }

    #[test]
    fn test_version_bumps_only_on_accepted() {
        let tracker = LiveDailyTracker::new(clock_at("2024-01-01T12:00:00"), NicheMap::new());
        let v0 = tracker.version();
        let pedido = order("O-1", "A", "30", "2024-01-01T09:00:00");
        tracker.ingest(&pedido);
        let v1 = tracker.version();
        assert!(v1 > v0);
        tracker.ingest(&pedido);
        assert_eq!(tracker.version(), v1);
    }
}
