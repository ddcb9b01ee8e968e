//! Built-in entity kinds

use super::{EntitySchema, FieldDef};

/// Every built-in entity kind, in the order `sync all` runs them
pub static ALL: &[&EntitySchema] = &[&PRODUCTS, &STOCK, &ACHATS, &SALES, &VENTE_DETAIL];

/// Purchase document lines
pub static ACHATS: EntitySchema = EntitySchema {
    name: "achats",
    description: "Purchase document lines",
    table: "achats",
    source_relation: "View_ACH_DOCUMENT_DETAIL_LIST",
    fields: &[
        FieldDef::text("code_doc", "CODE_DOC").key(),
        FieldDef::text("id_stock", "ID_STOCK"),
        FieldDef::text("code_produit", "CODE_PRODUIT"),
        FieldDef::text("lot", "LOT"),
        FieldDef::timestamp("date_peremption", "DATE_PEREMPTION"),
        FieldDef::decimal("quantite", "QUANTITE"),
        FieldDef::decimal("qte_bonus", "QTE_BONUS"),
        FieldDef::decimal("prix_unitaire", "PRIX_UNITAIRE"),
        FieldDef::decimal("ppa", "PPA"),
        FieldDef::decimal("shp", "SHP"),
        FieldDef::decimal("prix_vente", "PRIX_VENTE"),
        FieldDef::decimal("cout_achat", "COUT_ACHAT"),
        FieldDef::decimal("taux_marge", "TAUX_MARGE"),
        FieldDef::decimal("prix_ttc", "PRIX_TTC"),
        FieldDef::decimal("mt_ht", "MT_HT"),
        FieldDef::decimal("mt_tva", "MT_TVA"),
        FieldDef::decimal("mt_ttc", "MT_TTC"),
        FieldDef::decimal("mt_vente", "MT_VENTE"),
        FieldDef::text("code_barre_lot", "CODE_BARRE_LOT"),
        FieldDef::timestamp("created_on", "CREATED_ON"),
        FieldDef::text("created_by", "CREATED_BY"),
        FieldDef::bounded("ach_psychothrope", "ACH_PSYCHOTHROPE", 0, 9),
        FieldDef::text("num_doc", "NUM_DOC"),
        FieldDef::timestamp("date_doc", "DATE_DOC"),
        FieldDef::text("code_tiers", "CODE_TIERS"),
        FieldDef::text("ref_tiers", "REF_TIERS"),
        FieldDef::text("type_doc", "TYPE_DOC"),
        FieldDef::text("tiers_nomc", "TIERS_NOMC"),
        FieldDef::long_text("designation_produit", "DESIGNATION_PRODUIT"),
        FieldDef::decimal("qte_stock", "QTE_STOCK"),
        FieldDef::text("type_produit", "TYPE_PRODUIT"),
        FieldDef::decimal("mt_achat", "MT_ACHAT"),
        FieldDef::bounded("psychothrope", "PSYCHOTHROPE", 0, 9),
        FieldDef::long_text("designation_dci", "DESIGNATION_DCI"),
        FieldDef::text("reference", "REFERENCE"),
        FieldDef::text("titre_document", "TITRE_DOCUMENT"),
    ],
};

/// Inventory lots
pub static STOCK: EntitySchema = EntitySchema {
    name: "stock",
    description: "Inventory lots",
    table: "stock",
    source_relation: "View_STK_STOCK_LISTE",
    fields: &[
        FieldDef::text("id_stock", "ID_STOCK").key(),
        FieldDef::text("code_produit", "CODE_PRODUIT"),
        FieldDef::text("lot", "LOT"),
        FieldDef::timestamp("date_peremption", "DATE_PEREMPTION"),
        FieldDef::boolean("is_blocked", "IS_BLOCKED"),
        FieldDef::decimal("quantite", "QUANTITE"),
        FieldDef::decimal("cout_achat", "COUT_ACHAT"),
        FieldDef::decimal("val_stk", "VAL_STK"),
        FieldDef::decimal("shp", "SHP"),
        FieldDef::decimal("ppa", "PPA"),
        FieldDef::decimal("prix_vente", "PRIX_VENTE"),
        FieldDef::text("code_barre_lot", "CODE_BARRE_LOT"),
        FieldDef::text("fact_bl_lot", "FACT_BL_LOT"),
        FieldDef::decimal("mt_tva_achat", "MT_TVA_ACHAT"),
        FieldDef::decimal("prix_fournisseur", "PRIX_FOURNISSEUR"),
        FieldDef::boolean("actif", "ACTIF"),
        FieldDef::text("nom_fournisseur", "NOM_FOURNISSEUR"),
    ],
};

/// Product master data
pub static PRODUCTS: EntitySchema = EntitySchema {
    name: "products",
    description: "Product master data",
    table: "products",
    source_relation: "View_STK_PRODUITS",
    fields: &[
        FieldDef::text("code_produit", "CODE_PRODUIT").key(),
        FieldDef::long_text("designation_produit", "DESIGNATION_PRODUIT"),
        FieldDef::bounded("psychothrope", "PSYCHOTHROPE", 0, 9),
        FieldDef::text("reference", "REFERENCE"),
        FieldDef::long_text("design_dci", "DESIGN_DCI"),
        FieldDef::decimal("qte_stock", "QTE_STOCK"),
        FieldDef::decimal("prix_vente_ht", "PRIX_VENTE_HT"),
        FieldDef::decimal("qte_stock_ref", "QTE_STOCK_REF"),
        FieldDef::decimal("prix_achat_ht", "PRIX_ACHAT_HT"),
        FieldDef::text("design_type", "DESIGN_TYPE"),
    ],
};

/// Net sales per product over the trailing 90 days.
///
/// The aggregation itself lives in the source view.
pub static SALES: EntitySchema = EntitySchema {
    name: "sales",
    description: "Net sales per product (90 days)",
    table: "sales",
    source_relation: "View_VTE_NET_SALES_90J",
    fields: &[
        FieldDef::text("code_produit", "CODE_PRODUIT").key(),
        FieldDef::long_text("designation_produit", "DESIGNATION_PRODUIT"),
        FieldDef::decimal("net_sales", "NET_SALES"),
    ],
};

/// Sale lines over the trailing 90 days
pub static VENTE_DETAIL: EntitySchema = EntitySchema {
    name: "vente_detail",
    description: "Sale lines (90 days)",
    table: "vente_detail",
    source_relation: "View_VTE_VENTE_DETAIL_90J",
    fields: &[
        FieldDef::text("num_vente", "NUM_VENTE").key(),
        FieldDef::long_text("nom_tiers", "NOM_TIERS"),
        FieldDef::text("code_tiers", "CODE_TIERS"),
        FieldDef::text("code_vente", "CODE_VENTE"),
        FieldDef::long_text("titre", "TITRE"),
        FieldDef::text("id_stock", "ID_STOCK").key(),
        FieldDef::text("code_produit", "CODE_PRODUIT"),
        FieldDef::decimal("quantite", "QUANTITE"),
        FieldDef::decimal("remise", "REMISE"),
        FieldDef::timestamp("created_on", "CREATED_ON"),
        FieldDef::text("created_by", "CREATED_BY"),
    ],
};
