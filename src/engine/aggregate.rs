//! Pure period aggregation over a set of order records.
//!
//! Everything here is a deterministic fold: no I/O, no shared state, and
//! `BTreeMap` grouping throughout so any permutation of the same input set
//! produces byte-identical output. Net profit is always recomputed from the
//! cost fields (`Order::net_profit`), never copied from the persisted
//! `profit` column.

use crate::domain::{Decimal, NicheMap, Nicho, Order, Sku};
use crate::report::shapes::{
    AnaliseNicho, AnaliseSku, Custos, Indices, KpisGerais, NichoDoDia, PedidoResumo, PorDiaSemana,
    PorHora, RankingEntry, Rankings, RelatorioDia, Relatorios, ResumoDia, TicketMedio,
};
use chrono::{Datelike, NaiveDate, Timelike};
use std::collections::{BTreeMap, BTreeSet};

pub const TOP_NICHOS_LIMIT: usize = 10;
pub const TOP_SKUS_LIMIT: usize = 10;
pub const TOP_ADS_LIMIT: usize = 30;
pub const TOP_PER_NICHO_LIMIT: usize = 15;
pub const LAST_SALES_LIMIT: usize = 15;

/// Running sums for one grouping bucket.
#[derive(Debug, Clone, Default)]
struct Acc {
    faturamento: Decimal,
    lucro_bruto: Decimal,
    lucro_liquido: Decimal,
    pedidos: u64,
    unidades: u64,
    custo: Decimal,
    frete: Decimal,
    impostos: Decimal,
    rentabilidade_soma: Decimal,
    profitabilidade_soma: Decimal,
}

impl Acc {
    fn fold(&mut self, order: &Order) {
        self.faturamento += order.total_value;
        self.lucro_bruto += order.gross_profit;
        self.lucro_liquido += order.net_profit();
        self.pedidos += 1;
        self.unidades += u64::from(order.quantity);
        self.custo += order.cost;
        self.frete += order.freight;
        self.impostos += order.taxes;
        self.rentabilidade_soma += order.rentability;
        self.profitabilidade_soma += order.profitability;
    }

    fn ticket_medio(&self) -> TicketMedio {
        TicketMedio {
            pedido: self
                .faturamento
                .div_or_zero(Decimal::from_i64(self.pedidos as i64)),
            unidade: self
                .faturamento
                .div_or_zero(Decimal::from_i64(self.unidades as i64)),
        }
    }

    fn media(&self, soma: Decimal) -> Decimal {
        soma.div_or_zero(Decimal::from_i64(self.pedidos as i64))
    }
}

/// Per-SKU bucket with its resolved niche attached.
#[derive(Debug, Clone)]
struct SkuAcc {
    nicho: Nicho,
    acc: Acc,
}

/// Per-day bucket with its nested niche breakdown.
#[derive(Debug, Clone, Default)]
struct DiaAcc {
    acc: Acc,
    nichos: BTreeMap<Nicho, Acc>,
}

/// Output of one aggregation pass, ready for the report composer.
#[derive(Debug, Clone)]
pub struct PeriodAggregate {
    pub kpis_gerais: KpisGerais,
    pub relatorios: Relatorios,
    pub rankings: Rankings,
    /// Chronological per-day net profit, input for the forecast estimator.
    pub serie_diaria: Vec<(NaiveDate, Decimal)>,
}

impl PeriodAggregate {
    pub fn is_empty(&self) -> bool {
        self.kpis_gerais.total_pedidos == 0
    }
}

/// Aggregate orders over the inclusive `[start, end]` date range.
///
/// Date comparison uses only the date component of `payment_date`. An empty
/// filtered set yields an all-zero aggregate, not an error.
pub fn aggregate(
    orders: &[Order],
    start: NaiveDate,
    end: NaiveDate,
    map: &NicheMap,
) -> PeriodAggregate {
    let dias_totais = (end - start).num_days() + 1;
    let dias_totais_dec = Decimal::from_i64(dias_totais.max(1));

    let mut total = Acc::default();
    let mut por_nicho: BTreeMap<Nicho, Acc> = BTreeMap::new();
    let mut por_sku: BTreeMap<Sku, SkuAcc> = BTreeMap::new();
    let mut por_dia: BTreeMap<NaiveDate, DiaAcc> = BTreeMap::new();
    let mut por_hora: BTreeMap<u32, Acc> = BTreeMap::new();
    let mut por_dia_semana: BTreeMap<u32, Acc> = BTreeMap::new();
    let mut por_ad: BTreeMap<String, Acc> = BTreeMap::new();
    let mut por_nicho_sku: BTreeMap<(Nicho, Sku), Acc> = BTreeMap::new();
    let mut skus_sem_nicho: BTreeSet<String> = BTreeSet::new();
    let mut selecionados: Vec<&Order> = Vec::new();

    for order in orders {
        let dia = order.payment_date.date();
        if dia < start || dia > end {
            continue;
        }
        selecionados.push(order);

        let nicho = map.resolve(order);
        if nicho.is_sem_nicho() {
            skus_sem_nicho.insert(order.sku.as_str().to_string());
        }

        total.fold(order);
        por_nicho.entry(nicho.clone()).or_default().fold(order);

        let sku_bucket = por_sku.entry(order.sku.clone()).or_insert_with(|| SkuAcc {
            nicho: nicho.clone(),
            acc: Acc::default(),
        });
        // Keep the lexicographically smallest resolved niche so the
        // attachment is independent of input order.
        if nicho < sku_bucket.nicho {
            sku_bucket.nicho = nicho.clone();
        }
        sku_bucket.acc.fold(order);

        let dia_bucket = por_dia.entry(dia).or_default();
        dia_bucket.acc.fold(order);
        dia_bucket.nichos.entry(nicho.clone()).or_default().fold(order);

        por_hora
            .entry(order.payment_date.hour())
            .or_default()
            .fold(order);
        por_dia_semana
            .entry(order.payment_date.weekday().num_days_from_monday())
            .or_default()
            .fold(order);
        por_ad
            .entry(order.ad.as_str().to_string())
            .or_default()
            .fold(order);
        por_nicho_sku
            .entry((nicho, order.sku.clone()))
            .or_default()
            .fold(order);
    }

    let kpis_gerais = build_kpis(&total, skus_sem_nicho);
    let relatorios = build_relatorios(
        &total,
        &por_nicho,
        &por_sku,
        &por_dia,
        &por_hora,
        &por_dia_semana,
        selecionados,
        map,
        dias_totais_dec,
    );
    let rankings = build_rankings(&por_sku, &por_ad, &por_nicho_sku);
    let serie_diaria = por_dia
        .iter()
        .map(|(dia, bucket)| (*dia, bucket.acc.lucro_liquido))
        .collect();

    PeriodAggregate {
        kpis_gerais,
        relatorios,
        rankings,
        serie_diaria,
    }
}

fn build_kpis(total: &Acc, skus_sem_nicho: BTreeSet<String>) -> KpisGerais {
    KpisGerais {
        faturamento_total: total.faturamento,
        lucro_bruto_total: total.lucro_bruto,
        lucro_liquido_total: total.lucro_liquido,
        total_pedidos: total.pedidos,
        total_unidades: total.unidades,
        ticket_medio: total.ticket_medio(),
        custos: Custos {
            custo_total: total.custo,
            frete_total: total.frete,
            impostos_total: total.impostos,
        },
        indices: Indices {
            rentabilidade_media: total.lucro_liquido.percent_of(total.faturamento),
            profitabilidade_media: total.media(total.profitabilidade_soma),
        },
        skus_sem_nicho: skus_sem_nicho.into_iter().collect(),
    }
}

#[allow(clippy::too_many_arguments)]
fn build_relatorios(
    total: &Acc,
    por_nicho: &BTreeMap<Nicho, Acc>,
    por_sku: &BTreeMap<Sku, SkuAcc>,
    por_dia: &BTreeMap<NaiveDate, DiaAcc>,
    por_hora: &BTreeMap<u32, Acc>,
    por_dia_semana: &BTreeMap<u32, Acc>,
    mut selecionados: Vec<&Order>,
    map: &NicheMap,
    dias_totais: Decimal,
) -> Relatorios {
    let diario = por_dia
        .iter()
        .map(|(dia, bucket)| RelatorioDia {
            data: *dia,
            resumo: ResumoDia {
                faturamento: bucket.acc.faturamento,
                lucro_bruto: bucket.acc.lucro_bruto,
                lucro_liquido: bucket.acc.lucro_liquido,
                total_pedidos: bucket.acc.pedidos,
                total_unidades: bucket.acc.unidades,
                ticket_medio: bucket.acc.ticket_medio(),
            },
            nichos: bucket
                .nichos
                .iter()
                .map(|(nicho, acc)| NichoDoDia {
                    nicho: nicho.as_str().to_string(),
                    faturamento: acc.faturamento,
                    lucro_bruto: acc.lucro_bruto,
                    lucro_liquido: acc.lucro_liquido,
                    total_pedidos: acc.pedidos,
                    total_unidades: acc.unidades,
                })
                .collect(),
        })
        .collect();

    let analise_nicho = por_nicho
        .iter()
        .map(|(nicho, acc)| AnaliseNicho {
            nicho: nicho.as_str().to_string(),
            lucro_liquido: acc.lucro_liquido,
            lucro_bruto: acc.lucro_bruto,
            total_pedidos: acc.pedidos,
            total_unidades: acc.unidades,
            faturamento_total: acc.faturamento,
            frete_total: acc.frete,
            impostos_total: acc.impostos,
            custo_total: acc.custo,
            rentabilidade_media: acc.media(acc.rentabilidade_soma),
            profitabilidade_media: acc.media(acc.profitabilidade_soma),
            participacao_faturamento: acc.faturamento.div_or_zero(total.faturamento),
            participacao_lucro: acc.lucro_liquido.div_or_zero(total.lucro_liquido),
            media_dia_valor: acc.faturamento / dias_totais,
            media_dia_unidades: Decimal::from_i64(acc.unidades as i64) / dias_totais,
        })
        .collect();

    let analise_sku = por_sku
        .iter()
        .map(|(sku, bucket)| AnaliseSku {
            sku: sku.as_str().to_string(),
            nicho: bucket.nicho.as_str().to_string(),
            lucro_liquido: bucket.acc.lucro_liquido,
            lucro_bruto: bucket.acc.lucro_bruto,
            total_pedidos: bucket.acc.pedidos,
            total_unidades: bucket.acc.unidades,
            faturamento_total: bucket.acc.faturamento,
        })
        .collect();

    let horas = por_hora
        .iter()
        .map(|(hora, acc)| PorHora {
            hora: *hora,
            lucro_liquido: acc.lucro_liquido,
            faturamento: acc.faturamento,
            total_pedidos: acc.pedidos,
        })
        .collect();

    let dias_semana = por_dia_semana
        .iter()
        .map(|(dia_semana, acc)| PorDiaSemana {
            dia_semana: *dia_semana,
            lucro_liquido: acc.lucro_liquido,
            faturamento: acc.faturamento,
            total_pedidos: acc.pedidos,
        })
        .collect();

    // Newest first; order_key breaks timestamp ties deterministically.
    selecionados.sort_by(|a, b| {
        b.payment_date
            .cmp(&a.payment_date)
            .then_with(|| a.order_key().cmp(&b.order_key()))
    });
    let pedidos_lista = selecionados
        .iter()
        .map(|order| pedido_resumo(order, map, true))
        .collect();

    Relatorios {
        diario,
        por_nicho: analise_nicho,
        por_sku: analise_sku,
        por_hora: horas,
        por_dia_semana: dias_semana,
        pedidos_lista,
    }
}

fn build_rankings(
    por_sku: &BTreeMap<Sku, SkuAcc>,
    por_ad: &BTreeMap<String, Acc>,
    por_nicho_sku: &BTreeMap<(Nicho, Sku), Acc>,
) -> Rankings {
    let mut top_skus: Vec<RankingEntry> = por_sku
        .iter()
        .map(|(sku, bucket)| RankingEntry {
            chave: sku.as_str().to_string(),
            nicho: Some(bucket.nicho.as_str().to_string()),
            lucro_liquido: bucket.acc.lucro_liquido,
            lucro_bruto: bucket.acc.lucro_bruto,
            movimento: None,
        })
        .collect();
    sort_ranking(&mut top_skus);
    top_skus.truncate(TOP_SKUS_LIMIT);

    let mut top_ads: Vec<RankingEntry> = por_ad
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

    let mut top_por_nicho: Vec<RankingEntry> = Vec::new();
    let mut top_skus_per_nicho: BTreeMap<String, Vec<RankingEntry>> = BTreeMap::new();
    let mut por_nicho_agrupado: BTreeMap<&Nicho, Vec<RankingEntry>> = BTreeMap::new();
    for ((nicho, sku), acc) in por_nicho_sku {
        por_nicho_agrupado
            .entry(nicho)
            .or_default()
            .push(RankingEntry {
                chave: sku.as_str().to_string(),
                nicho: Some(nicho.as_str().to_string()),
                lucro_liquido: acc.lucro_liquido,
                lucro_bruto: acc.lucro_bruto,
                movimento: None,
            });
    }
    for (nicho, mut entries) in por_nicho_agrupado {
        sort_ranking(&mut entries);
        entries.truncate(TOP_PER_NICHO_LIMIT);
        top_por_nicho.extend(entries.iter().cloned());
        top_skus_per_nicho.insert(nicho.as_str().to_string(), entries);
    }

    Rankings {
        top_skus,
        top_ads,
        top_por_nicho,
        top_skus_per_nicho,
    }
}

/// Sort descending by net profit; ties broken by key ascending so repeated
/// calls on permuted input stay stable.
pub fn sort_ranking(entries: &mut [RankingEntry]) {
    entries.sort_by(|a, b| {
        b.lucro_liquido
            .cmp(&a.lucro_liquido)
            .then_with(|| a.chave.cmp(&b.chave))
    });
}

/// Project an order into the list shape shared by `pedidos_lista` and the
/// live-report sale lists.
pub fn pedido_resumo(order: &Order, map: &NicheMap, com_hora: bool) -> PedidoResumo {
    PedidoResumo {
        payment_date: order.payment_date,
        order_id: order.order_id.clone(),
        cart_id: order.cart_id.clone(),
        sku: order.sku.as_str().to_string(),
        title: order.title.clone(),
        quantity: order.quantity,
        total_value: order.total_value,
        profit: order.profit,
        nicho: map.resolve(order).as_str().to_string(),
        hora: com_hora.then(|| order.payment_date.hour()),
    }
}
