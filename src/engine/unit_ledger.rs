// ==========================================
// 缺货损失报表 - 单品台账读取器
// ==========================================
// 职责: 按 (sku, supplier, warehouse, category) 汇总窗口内的交付与订单
// 输入: unit + product + unit_order + delivery
// 输出: UnitLedgerRow（每个分组一行）
// 红线: 包装规格不得以空值流入下游除法；缺失关联计为 0，不报错
// ==========================================

use crate::config::ReportSettings;
use crate::domain::ledger::{LedgerInputs, Product};
use crate::domain::types::{CategoryFilter, ReportRequest};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, instrument};

/// 台账分组主键
///
/// sku_id / category 为空表示单品找不到产品参考数据或产品未分类。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LedgerGroupKey {
    pub sku_id: Option<String>,
    pub supplier_name: String,
    pub warehouse_id: String,
    pub category: Option<String>,
}

/// 台账分组汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnitLedgerRow {
    pub key: LedgerGroupKey,
    pub sku_name: Option<String>,
    /// 在库单品的平均包装规格，无在库单品时取默认值
    pub bundle_size: f64,
    pub internal_quantity: Option<f64>,
    /// 窗口内有交付的去重单品数
    pub num_units_delivered: i64,
    /// 窗口内打包的订单数
    pub num_orders: i64,
}

/// 台账读取结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LedgerReadout {
    pub rows: Vec<UnitLedgerRow>,
    pub units_missing_product: usize,
    pub groups_filtered_by_category: usize,
}

#[derive(Default)]
struct GroupAccumulator<'a> {
    sku_name: Option<&'a str>,
    bundle_sum: f64,
    bundle_count: usize,
    internal_sum: f64,
    internal_count: usize,
    delivered_units: HashSet<&'a str>,
    num_orders: i64,
}

impl<'a> GroupAccumulator<'a> {
    fn offer_name(&mut self, name: Option<&'a str>) {
        // 取字典序最小的非空名称，保证重跑结果一致
        if let Some(n) = name {
            match self.sku_name {
                Some(current) if current <= n => {}
                _ => self.sku_name = Some(n),
            }
        }
    }

    fn into_row(self, key: LedgerGroupKey, default_bundle_size: f64) -> UnitLedgerRow {
        let bundle_size = if self.bundle_count > 0 {
            self.bundle_sum / self.bundle_count as f64
        } else {
            default_bundle_size
        };
        let internal_quantity = if self.internal_count > 0 {
            Some(self.internal_sum / self.internal_count as f64)
        } else {
            None
        };

        UnitLedgerRow {
            key,
            sku_name: self.sku_name.map(str::to_string),
            bundle_size,
            internal_quantity,
            num_units_delivered: self.delivered_units.len() as i64,
            num_orders: self.num_orders,
        }
    }
}

// ==========================================
// UnitLedgerReader - 单品台账读取器
// ==========================================
pub struct UnitLedgerReader<'s> {
    settings: &'s ReportSettings,
}

impl<'s> UnitLedgerReader<'s> {
    pub fn new(settings: &'s ReportSettings) -> Self {
        Self { settings }
    }

    /// 读取并汇总台账
    ///
    /// # 口径
    /// - 交付: delivered_at ∈ [start, end + 1 天)，按单品去重
    /// - 订单: packaged_at ∈ [start, end]
    /// - 品类过滤: `All` 保留空品类；`Only` 排除空品类
    #[instrument(skip(self, inputs, request), fields(window = %request.window, units = inputs.units.len()))]
    pub fn read(&self, inputs: &LedgerInputs, request: &ReportRequest) -> LedgerReadout {
        let window = &request.window;

        let products: HashMap<&str, &Product> = inputs
            .products
            .iter()
            .map(|p| (p.product_key.as_str(), p))
            .collect();

        let delivered_packages: HashSet<&str> = inputs
            .deliveries
            .iter()
            .filter(|d| window.contains_delivery(d.delivered_at))
            .map(|d| d.package_key.as_str())
            .collect();

        let mut groups: BTreeMap<LedgerGroupKey, GroupAccumulator> = BTreeMap::new();
        let mut unit_group: HashMap<&str, LedgerGroupKey> = HashMap::new();
        let mut units_missing_product = 0usize;

        for unit in &inputs.units {
            let product = products.get(unit.product_key.as_str()).copied();
            if product.is_none() {
                units_missing_product += 1;
                debug!(unit_key = %unit.unit_key, product_key = %unit.product_key, "单品缺少产品参考数据");
            }

            let key = LedgerGroupKey {
                sku_id: product.map(|p| p.product_id.clone()),
                supplier_name: unit.supplier_name.clone(),
                warehouse_id: unit.warehouse_id.clone(),
                category: product.and_then(|p| p.category.clone()),
            };

            let acc = groups.entry(key.clone()).or_default();
            acc.offer_name(product.and_then(|p| p.product_name.as_deref()));

            if self.settings.is_stocked(&unit.stock_status) {
                if let Some(bundle) = unit.bundle_size {
                    acc.bundle_sum += bundle;
                    acc.bundle_count += 1;
                }
                if let Some(qty) = unit.internal_quantity {
                    acc.internal_sum += qty;
                    acc.internal_count += 1;
                }
            }

            unit_group.insert(unit.unit_key.as_str(), key);
        }

        for order in &inputs.orders {
            // 订单指向不存在的单品时没有分组可归属
            let Some(key) = unit_group.get(order.unit_key.as_str()) else {
                continue;
            };
            let Some(acc) = groups.get_mut(key) else {
                continue;
            };

            if window.contains_packaging(order.packaged_at) {
                acc.num_orders += 1;
            }
            if let Some(package_key) = order.package_key.as_deref() {
                if delivered_packages.contains(package_key) {
                    acc.delivered_units.insert(order.unit_key.as_str());
                }
            }
        }

        let mut groups_filtered_by_category = 0usize;
        let rows: Vec<UnitLedgerRow> = groups
            .into_iter()
            .filter(|(key, _)| {
                let keep = request.category_filter.matches(key.category.as_deref());
                if !keep {
                    groups_filtered_by_category += 1;
                }
                keep
            })
            .map(|(key, acc)| acc.into_row(key, self.settings.default_bundle_size))
            .collect();

        if let CategoryFilter::Only(set) = &request.category_filter {
            debug!(categories = ?set, filtered = groups_filtered_by_category, "品类过滤完成");
        }

        LedgerReadout {
            rows,
            units_missing_product,
            groups_filtered_by_category,
        }
    }
}
