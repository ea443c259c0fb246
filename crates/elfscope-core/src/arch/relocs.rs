//! Relocation type names, one table per architecture family.
//!
//! Tables are sorted by number so lookups can binary search.

use object::elf::{
    EM_386, EM_AARCH64, EM_ALPHA, EM_ARM, EM_IA_64, EM_LOONGARCH, EM_MIPS, EM_PARISC, EM_PPC, EM_PPC64, EM_RISCV,
    EM_S390, EM_SPARC, EM_SPARC32PLUS, EM_SPARCV9, EM_X86_64,
};

const X86_64: &[(u32, &str)] = &[
    (0, "R_X86_64_NONE"),
    (1, "R_X86_64_64"),
    (2, "R_X86_64_PC32"),
    (3, "R_X86_64_GOT32"),
    (4, "R_X86_64_PLT32"),
    (5, "R_X86_64_COPY"),
    (6, "R_X86_64_GLOB_DAT"),
    (7, "R_X86_64_JUMP_SLOT"),
    (8, "R_X86_64_RELATIVE"),
    (9, "R_X86_64_GOTPCREL"),
    (10, "R_X86_64_32"),
    (11, "R_X86_64_32S"),
    (12, "R_X86_64_16"),
    (13, "R_X86_64_PC16"),
    (14, "R_X86_64_8"),
    (15, "R_X86_64_PC8"),
    (16, "R_X86_64_DTPMOD64"),
    (17, "R_X86_64_DTPOFF64"),
    (18, "R_X86_64_TPOFF64"),
    (19, "R_X86_64_TLSGD"),
    (20, "R_X86_64_TLSLD"),
    (21, "R_X86_64_DTPOFF32"),
    (22, "R_X86_64_GOTTPOFF"),
    (23, "R_X86_64_TPOFF32"),
    (24, "R_X86_64_PC64"),
    (25, "R_X86_64_GOTOFF64"),
    (26, "R_X86_64_GOTPC32"),
    (27, "R_X86_64_GOT64"),
    (28, "R_X86_64_GOTPCREL64"),
    (29, "R_X86_64_GOTPC64"),
    (30, "R_X86_64_GOTPLT64"),
    (31, "R_X86_64_PLTOFF64"),
    (32, "R_X86_64_SIZE32"),
    (33, "R_X86_64_SIZE64"),
    (34, "R_X86_64_GOTPC32_TLSDESC"),
    (35, "R_X86_64_TLSDESC_CALL"),
    (36, "R_X86_64_TLSDESC"),
    (37, "R_X86_64_IRELATIVE"),
    (38, "R_X86_64_RELATIVE64"),
    (41, "R_X86_64_GOTPCRELX"),
    (42, "R_X86_64_REX_GOTPCRELX"),
];

const I386: &[(u32, &str)] = &[
    (0, "R_386_NONE"),
    (1, "R_386_32"),
    (2, "R_386_PC32"),
    (3, "R_386_GOT32"),
    (4, "R_386_PLT32"),
    (5, "R_386_COPY"),
    (6, "R_386_GLOB_DAT"),
    (7, "R_386_JUMP_SLOT"),
    (8, "R_386_RELATIVE"),
    (9, "R_386_GOTOFF"),
    (10, "R_386_GOTPC"),
    (11, "R_386_32PLT"),
    (14, "R_386_TLS_TPOFF"),
    (15, "R_386_TLS_IE"),
    (16, "R_386_TLS_GOTIE"),
    (17, "R_386_TLS_LE"),
    (18, "R_386_TLS_GD"),
    (19, "R_386_TLS_LDM"),
    (20, "R_386_16"),
    (21, "R_386_PC16"),
    (22, "R_386_8"),
    (23, "R_386_PC8"),
    (24, "R_386_TLS_GD_32"),
    (25, "R_386_TLS_GD_PUSH"),
    (26, "R_386_TLS_GD_CALL"),
    (27, "R_386_TLS_GD_POP"),
    (28, "R_386_TLS_LDM_32"),
    (29, "R_386_TLS_LDM_PUSH"),
    (30, "R_386_TLS_LDM_CALL"),
    (31, "R_386_TLS_LDM_POP"),
    (32, "R_386_TLS_LDO_32"),
    (33, "R_386_TLS_IE_32"),
    (34, "R_386_TLS_LE_32"),
    (35, "R_386_TLS_DTPMOD32"),
    (36, "R_386_TLS_DTPOFF32"),
    (37, "R_386_TLS_TPOFF32"),
    (38, "R_386_SIZE32"),
    (39, "R_386_TLS_GOTDESC"),
    (40, "R_386_TLS_DESC_CALL"),
    (41, "R_386_TLS_DESC"),
    (42, "R_386_IRELATIVE"),
    (43, "R_386_GOT32X"),
];

const AARCH64: &[(u32, &str)] = &[
    (0, "R_AARCH64_NONE"),
    (257, "R_AARCH64_ABS64"),
    (258, "R_AARCH64_ABS32"),
    (259, "R_AARCH64_ABS16"),
    (260, "R_AARCH64_PREL64"),
    (261, "R_AARCH64_PREL32"),
    (262, "R_AARCH64_PREL16"),
    (263, "R_AARCH64_MOVW_UABS_G0"),
    (264, "R_AARCH64_MOVW_UABS_G0_NC"),
    (265, "R_AARCH64_MOVW_UABS_G1"),
    (266, "R_AARCH64_MOVW_UABS_G1_NC"),
    (267, "R_AARCH64_MOVW_UABS_G2"),
    (268, "R_AARCH64_MOVW_UABS_G2_NC"),
    (269, "R_AARCH64_MOVW_UABS_G3"),
    (270, "R_AARCH64_MOVW_SABS_G0"),
    (271, "R_AARCH64_MOVW_SABS_G1"),
    (272, "R_AARCH64_MOVW_SABS_G2"),
    (273, "R_AARCH64_LD_PREL_LO19"),
    (274, "R_AARCH64_ADR_PREL_LO21"),
    (275, "R_AARCH64_ADR_PREL_PG_HI21"),
    (276, "R_AARCH64_ADR_PREL_PG_HI21_NC"),
    (277, "R_AARCH64_ADD_ABS_LO12_NC"),
    (278, "R_AARCH64_LDST8_ABS_LO12_NC"),
    (279, "R_AARCH64_TSTBR14"),
    (280, "R_AARCH64_CONDBR19"),
    (282, "R_AARCH64_JUMP26"),
    (283, "R_AARCH64_CALL26"),
    (284, "R_AARCH64_LDST16_ABS_LO12_NC"),
    (285, "R_AARCH64_LDST32_ABS_LO12_NC"),
    (286, "R_AARCH64_LDST64_ABS_LO12_NC"),
    (299, "R_AARCH64_LDST128_ABS_LO12_NC"),
    (311, "R_AARCH64_ADR_GOT_PAGE"),
    (312, "R_AARCH64_LD64_GOT_LO12_NC"),
    (512, "R_AARCH64_TLSGD_ADR_PREL21"),
    (513, "R_AARCH64_TLSGD_ADR_PAGE21"),
    (514, "R_AARCH64_TLSGD_ADD_LO12_NC"),
    (541, "R_AARCH64_TLSIE_ADR_GOTTPREL_PAGE21"),
    (542, "R_AARCH64_TLSIE_LD64_GOTTPREL_LO12_NC"),
    (549, "R_AARCH64_TLSLE_ADD_TPREL_HI12"),
    (550, "R_AARCH64_TLSLE_ADD_TPREL_LO12"),
    (551, "R_AARCH64_TLSLE_ADD_TPREL_LO12_NC"),
    (560, "R_AARCH64_TLSDESC_ADR_PAGE21"),
    (561, "R_AARCH64_TLSDESC_LD64_LO12"),
    (562, "R_AARCH64_TLSDESC_ADD_LO12"),
    (569, "R_AARCH64_TLSDESC_CALL"),
    (1024, "R_AARCH64_COPY"),
    (1025, "R_AARCH64_GLOB_DAT"),
    (1026, "R_AARCH64_JUMP_SLOT"),
    (1027, "R_AARCH64_RELATIVE"),
    (1028, "R_AARCH64_TLS_DTPMOD64"),
    (1029, "R_AARCH64_TLS_DTPREL64"),
    (1030, "R_AARCH64_TLS_TPREL64"),
    (1031, "R_AARCH64_TLSDESC"),
    (1032, "R_AARCH64_IRELATIVE"),
];

const ARM: &[(u32, &str)] = &[
    (0, "R_ARM_NONE"),
    (1, "R_ARM_PC24"),
    (2, "R_ARM_ABS32"),
    (3, "R_ARM_REL32"),
    (4, "R_ARM_LDR_PC_G0"),
    (5, "R_ARM_ABS16"),
    (6, "R_ARM_ABS12"),
    (7, "R_ARM_THM_ABS5"),
    (8, "R_ARM_ABS8"),
    (9, "R_ARM_SBREL32"),
    (10, "R_ARM_THM_CALL"),
    (11, "R_ARM_THM_PC8"),
    (12, "R_ARM_BREL_ADJ"),
    (13, "R_ARM_TLS_DESC"),
    (17, "R_ARM_TLS_DTPMOD32"),
    (18, "R_ARM_TLS_DTPOFF32"),
    (19, "R_ARM_TLS_TPOFF32"),
    (20, "R_ARM_COPY"),
    (21, "R_ARM_GLOB_DAT"),
    (22, "R_ARM_JUMP_SLOT"),
    (23, "R_ARM_RELATIVE"),
    (24, "R_ARM_GOTOFF32"),
    (25, "R_ARM_BASE_PREL"),
    (26, "R_ARM_GOT_BREL"),
    (27, "R_ARM_PLT32"),
    (28, "R_ARM_CALL"),
    (29, "R_ARM_JUMP24"),
    (30, "R_ARM_THM_JUMP24"),
    (31, "R_ARM_BASE_ABS"),
    (38, "R_ARM_TARGET1"),
    (40, "R_ARM_V4BX"),
    (41, "R_ARM_TARGET2"),
    (42, "R_ARM_PREL31"),
    (43, "R_ARM_MOVW_ABS_NC"),
    (44, "R_ARM_MOVT_ABS"),
    (45, "R_ARM_MOVW_PREL_NC"),
    (46, "R_ARM_MOVT_PREL"),
    (47, "R_ARM_THM_MOVW_ABS_NC"),
    (48, "R_ARM_THM_MOVT_ABS"),
    (102, "R_ARM_THM_JUMP11"),
    (103, "R_ARM_THM_JUMP8"),
    (104, "R_ARM_TLS_GD32"),
    (105, "R_ARM_TLS_LDM32"),
    (106, "R_ARM_TLS_LDO32"),
    (107, "R_ARM_TLS_IE32"),
    (108, "R_ARM_TLS_LE32"),
    (160, "R_ARM_IRELATIVE"),
];

const RISCV: &[(u32, &str)] = &[
    (0, "R_RISCV_NONE"),
    (1, "R_RISCV_32"),
    (2, "R_RISCV_64"),
    (3, "R_RISCV_RELATIVE"),
    (4, "R_RISCV_COPY"),
    (5, "R_RISCV_JUMP_SLOT"),
    (6, "R_RISCV_TLS_DTPMOD32"),
    (7, "R_RISCV_TLS_DTPMOD64"),
    (8, "R_RISCV_TLS_DTPREL32"),
    (9, "R_RISCV_TLS_DTPREL64"),
    (10, "R_RISCV_TLS_TPREL32"),
    (11, "R_RISCV_TLS_TPREL64"),
    (16, "R_RISCV_BRANCH"),
    (17, "R_RISCV_JAL"),
    (18, "R_RISCV_CALL"),
    (19, "R_RISCV_CALL_PLT"),
    (20, "R_RISCV_GOT_HI20"),
    (21, "R_RISCV_TLS_GOT_HI20"),
    (22, "R_RISCV_TLS_GD_HI20"),
    (23, "R_RISCV_PCREL_HI20"),
    (24, "R_RISCV_PCREL_LO12_I"),
    (25, "R_RISCV_PCREL_LO12_S"),
    (26, "R_RISCV_HI20"),
    (27, "R_RISCV_LO12_I"),
    (28, "R_RISCV_LO12_S"),
    (29, "R_RISCV_TPREL_HI20"),
    (30, "R_RISCV_TPREL_LO12_I"),
    (31, "R_RISCV_TPREL_LO12_S"),
    (32, "R_RISCV_TPREL_ADD"),
    (33, "R_RISCV_ADD8"),
    (34, "R_RISCV_ADD16"),
    (35, "R_RISCV_ADD32"),
    (36, "R_RISCV_ADD64"),
    (37, "R_RISCV_SUB8"),
    (38, "R_RISCV_SUB16"),
    (39, "R_RISCV_SUB32"),
    (40, "R_RISCV_SUB64"),
    (43, "R_RISCV_ALIGN"),
    (44, "R_RISCV_RVC_BRANCH"),
    (45, "R_RISCV_RVC_JUMP"),
    (51, "R_RISCV_RELAX"),
    (52, "R_RISCV_SUB6"),
    (53, "R_RISCV_SET6"),
    (54, "R_RISCV_SET8"),
    (55, "R_RISCV_SET16"),
    (56, "R_RISCV_SET32"),
    (57, "R_RISCV_32_PCREL"),
    (58, "R_RISCV_IRELATIVE"),
];

const PPC: &[(u32, &str)] = &[
    (0, "R_PPC_NONE"),
    (1, "R_PPC_ADDR32"),
    (2, "R_PPC_ADDR24"),
    (3, "R_PPC_ADDR16"),
    (4, "R_PPC_ADDR16_LO"),
    (5, "R_PPC_ADDR16_HI"),
    (6, "R_PPC_ADDR16_HA"),
    (7, "R_PPC_ADDR14"),
    (8, "R_PPC_ADDR14_BRTAKEN"),
    (9, "R_PPC_ADDR14_BRNTAKEN"),
    (10, "R_PPC_REL24"),
    (11, "R_PPC_REL14"),
    (12, "R_PPC_REL14_BRTAKEN"),
    (13, "R_PPC_REL14_BRNTAKEN"),
    (14, "R_PPC_GOT16"),
    (15, "R_PPC_GOT16_LO"),
    (16, "R_PPC_GOT16_HI"),
    (17, "R_PPC_GOT16_HA"),
    (18, "R_PPC_PLTREL24"),
    (19, "R_PPC_COPY"),
    (20, "R_PPC_GLOB_DAT"),
    (21, "R_PPC_JMP_SLOT"),
    (22, "R_PPC_RELATIVE"),
    (23, "R_PPC_LOCAL24PC"),
    (24, "R_PPC_UADDR32"),
    (25, "R_PPC_UADDR16"),
    (26, "R_PPC_REL32"),
    (27, "R_PPC_PLT32"),
    (28, "R_PPC_PLTREL32"),
    (29, "R_PPC_PLT16_LO"),
    (30, "R_PPC_PLT16_HI"),
    (31, "R_PPC_PLT16_HA"),
    (32, "R_PPC_SDAREL16"),
    (33, "R_PPC_SECTOFF"),
    (67, "R_PPC_TLS"),
    (68, "R_PPC_DTPMOD32"),
    (248, "R_PPC_IRELATIVE"),
];

const PPC64: &[(u32, &str)] = &[
    (0, "R_PPC64_NONE"),
    (1, "R_PPC64_ADDR32"),
    (2, "R_PPC64_ADDR24"),
    (3, "R_PPC64_ADDR16"),
    (4, "R_PPC64_ADDR16_LO"),
    (5, "R_PPC64_ADDR16_HI"),
    (6, "R_PPC64_ADDR16_HA"),
    (7, "R_PPC64_ADDR14"),
    (10, "R_PPC64_REL24"),
    (11, "R_PPC64_REL14"),
    (14, "R_PPC64_GOT16"),
    (19, "R_PPC64_COPY"),
    (20, "R_PPC64_GLOB_DAT"),
    (21, "R_PPC64_JMP_SLOT"),
    (22, "R_PPC64_RELATIVE"),
    (24, "R_PPC64_UADDR32"),
    (25, "R_PPC64_UADDR16"),
    (26, "R_PPC64_REL32"),
    (38, "R_PPC64_ADDR64"),
    (39, "R_PPC64_ADDR16_HIGHER"),
    (40, "R_PPC64_ADDR16_HIGHERA"),
    (41, "R_PPC64_ADDR16_HIGHEST"),
    (42, "R_PPC64_ADDR16_HIGHESTA"),
    (43, "R_PPC64_UADDR64"),
    (44, "R_PPC64_REL64"),
    (47, "R_PPC64_TOC16"),
    (48, "R_PPC64_TOC16_LO"),
    (49, "R_PPC64_TOC16_HI"),
    (50, "R_PPC64_TOC16_HA"),
    (51, "R_PPC64_TOC"),
    (63, "R_PPC64_TOC16_DS"),
    (64, "R_PPC64_TOC16_LO_DS"),
    (67, "R_PPC64_TLS"),
    (68, "R_PPC64_DTPMOD64"),
    (73, "R_PPC64_TPREL64"),
    (78, "R_PPC64_DTPREL64"),
    (107, "R_PPC64_TLSGD"),
    (108, "R_PPC64_TLSLD"),
    (109, "R_PPC64_TOCSAVE"),
    (247, "R_PPC64_JMP_IREL"),
    (248, "R_PPC64_IRELATIVE"),
];

const MIPS: &[(u32, &str)] = &[
    (0, "R_MIPS_NONE"),
    (1, "R_MIPS_16"),
    (2, "R_MIPS_32"),
    (3, "R_MIPS_REL32"),
    (4, "R_MIPS_26"),
    (5, "R_MIPS_HI16"),
    (6, "R_MIPS_LO16"),
    (7, "R_MIPS_GPREL16"),
    (8, "R_MIPS_LITERAL"),
    (9, "R_MIPS_GOT16"),
    (10, "R_MIPS_PC16"),
    (11, "R_MIPS_CALL16"),
    (12, "R_MIPS_GPREL32"),
    (16, "R_MIPS_SHIFT5"),
    (17, "R_MIPS_SHIFT6"),
    (18, "R_MIPS_64"),
    (19, "R_MIPS_GOT_DISP"),
    (20, "R_MIPS_GOT_PAGE"),
    (21, "R_MIPS_GOT_OFST"),
    (22, "R_MIPS_GOT_HI16"),
    (23, "R_MIPS_GOT_LO16"),
    (24, "R_MIPS_SUB"),
    (25, "R_MIPS_INSERT_A"),
    (26, "R_MIPS_INSERT_B"),
    (27, "R_MIPS_DELETE"),
    (28, "R_MIPS_HIGHER"),
    (29, "R_MIPS_HIGHEST"),
    (30, "R_MIPS_CALL_HI16"),
    (31, "R_MIPS_CALL_LO16"),
    (32, "R_MIPS_SCN_DISP"),
    (33, "R_MIPS_REL16"),
    (34, "R_MIPS_ADD_IMMEDIATE"),
    (35, "R_MIPS_PJUMP"),
    (36, "R_MIPS_RELGOT"),
    (37, "R_MIPS_JALR"),
    (38, "R_MIPS_TLS_DTPMOD32"),
    (39, "R_MIPS_TLS_DTPREL32"),
    (40, "R_MIPS_TLS_DTPMOD64"),
    (41, "R_MIPS_TLS_DTPREL64"),
    (42, "R_MIPS_TLS_GD"),
    (43, "R_MIPS_TLS_LDM"),
    (44, "R_MIPS_TLS_DTPREL_HI16"),
    (45, "R_MIPS_TLS_DTPREL_LO16"),
    (46, "R_MIPS_TLS_GOTTPREL"),
    (47, "R_MIPS_TLS_TPREL32"),
    (48, "R_MIPS_TLS_TPREL64"),
    (49, "R_MIPS_TLS_TPREL_HI16"),
    (50, "R_MIPS_TLS_TPREL_LO16"),
    (51, "R_MIPS_GLOB_DAT"),
    (126, "R_MIPS_COPY"),
    (127, "R_MIPS_JUMP_SLOT"),
];

const SPARC: &[(u32, &str)] = &[
    (0, "R_SPARC_NONE"),
    (1, "R_SPARC_8"),
    (2, "R_SPARC_16"),
    (3, "R_SPARC_32"),
    (4, "R_SPARC_DISP8"),
    (5, "R_SPARC_DISP16"),
    (6, "R_SPARC_DISP32"),
    (7, "R_SPARC_WDISP30"),
    (8, "R_SPARC_WDISP22"),
    (9, "R_SPARC_HI22"),
    (10, "R_SPARC_22"),
    (11, "R_SPARC_13"),
    (12, "R_SPARC_LO10"),
    (13, "R_SPARC_GOT10"),
    (14, "R_SPARC_GOT13"),
    (15, "R_SPARC_GOT22"),
    (16, "R_SPARC_PC10"),
    (17, "R_SPARC_PC22"),
    (18, "R_SPARC_WPLT30"),
    (19, "R_SPARC_COPY"),
    (20, "R_SPARC_GLOB_DAT"),
    (21, "R_SPARC_JMP_SLOT"),
    (22, "R_SPARC_RELATIVE"),
    (23, "R_SPARC_UA32"),
    (24, "R_SPARC_PLT32"),
    (25, "R_SPARC_HIPLT22"),
    (26, "R_SPARC_LOPLT10"),
    (27, "R_SPARC_PCPLT32"),
    (28, "R_SPARC_PCPLT22"),
    (29, "R_SPARC_PCPLT10"),
    (30, "R_SPARC_10"),
    (31, "R_SPARC_11"),
    (32, "R_SPARC_64"),
    (33, "R_SPARC_OLO10"),
    (34, "R_SPARC_HH22"),
    (35, "R_SPARC_HM10"),
    (36, "R_SPARC_LM22"),
    (37, "R_SPARC_PC_HH22"),
    (38, "R_SPARC_PC_HM10"),
    (39, "R_SPARC_PC_LM22"),
    (40, "R_SPARC_WDISP16"),
    (41, "R_SPARC_WDISP19"),
    (43, "R_SPARC_7"),
    (44, "R_SPARC_5"),
    (45, "R_SPARC_6"),
    (46, "R_SPARC_DISP64"),
    (47, "R_SPARC_PLT64"),
    (48, "R_SPARC_HIX22"),
    (49, "R_SPARC_LOX10"),
    (50, "R_SPARC_H44"),
    (51, "R_SPARC_M44"),
    (52, "R_SPARC_L44"),
    (53, "R_SPARC_REGISTER"),
    (54, "R_SPARC_UA64"),
    (55, "R_SPARC_UA16"),
    (249, "R_SPARC_IRELATIVE"),
];

const S390: &[(u32, &str)] = &[
    (0, "R_390_NONE"),
    (1, "R_390_8"),
    (2, "R_390_12"),
    (3, "R_390_16"),
    (4, "R_390_32"),
    (5, "R_390_PC32"),
    (6, "R_390_GOT12"),
    (7, "R_390_GOT32"),
    (8, "R_390_PLT32"),
    (9, "R_390_COPY"),
    (10, "R_390_GLOB_DAT"),
    (11, "R_390_JMP_SLOT"),
    (12, "R_390_RELATIVE"),
    (13, "R_390_GOTOFF32"),
    (14, "R_390_GOTPC"),
    (15, "R_390_GOT16"),
    (16, "R_390_PC16"),
    (17, "R_390_PC16DBL"),
    (18, "R_390_PLT16DBL"),
    (19, "R_390_PC32DBL"),
    (20, "R_390_PLT32DBL"),
    (21, "R_390_GOTPCDBL"),
    (22, "R_390_64"),
    (23, "R_390_PC64"),
    (24, "R_390_GOT64"),
    (25, "R_390_PLT64"),
    (26, "R_390_GOTENT"),
    (61, "R_390_IRELATIVE"),
];

const IA64: &[(u32, &str)] = &[
    (0x00, "R_IA64_NONE"),
    (0x21, "R_IA64_IMM14"),
    (0x22, "R_IA64_IMM22"),
    (0x23, "R_IA64_IMM64"),
    (0x24, "R_IA64_DIR32MSB"),
    (0x25, "R_IA64_DIR32LSB"),
    (0x26, "R_IA64_DIR64MSB"),
    (0x27, "R_IA64_DIR64LSB"),
    (0x2a, "R_IA64_GPREL22"),
    (0x2b, "R_IA64_GPREL64I"),
    (0x2c, "R_IA64_GPREL32MSB"),
    (0x2d, "R_IA64_GPREL32LSB"),
    (0x2e, "R_IA64_GPREL64MSB"),
    (0x2f, "R_IA64_GPREL64LSB"),
    (0x32, "R_IA64_LTOFF22"),
    (0x33, "R_IA64_LTOFF64I"),
    (0x3a, "R_IA64_PLTOFF22"),
    (0x3b, "R_IA64_PLTOFF64I"),
    (0x3e, "R_IA64_PLTOFF64MSB"),
    (0x3f, "R_IA64_PLTOFF64LSB"),
    (0x43, "R_IA64_FPTR64I"),
    (0x44, "R_IA64_FPTR32MSB"),
    (0x45, "R_IA64_FPTR32LSB"),
    (0x46, "R_IA64_FPTR64MSB"),
    (0x47, "R_IA64_FPTR64LSB"),
    (0x48, "R_IA64_PCREL60B"),
    (0x49, "R_IA64_PCREL21B"),
    (0x4a, "R_IA64_PCREL21M"),
    (0x4b, "R_IA64_PCREL21F"),
    (0x4c, "R_IA64_PCREL32MSB"),
    (0x4d, "R_IA64_PCREL32LSB"),
    (0x4e, "R_IA64_PCREL64MSB"),
    (0x4f, "R_IA64_PCREL64LSB"),
    (0x52, "R_IA64_LTOFF_FPTR22"),
    (0x53, "R_IA64_LTOFF_FPTR64I"),
    (0x54, "R_IA64_LTOFF_FPTR32MSB"),
    (0x55, "R_IA64_LTOFF_FPTR32LSB"),
    (0x56, "R_IA64_LTOFF_FPTR64MSB"),
    (0x57, "R_IA64_LTOFF_FPTR64LSB"),
    (0x5c, "R_IA64_SEGREL32MSB"),
    (0x5d, "R_IA64_SEGREL32LSB"),
    (0x5e, "R_IA64_SEGREL64MSB"),
    (0x5f, "R_IA64_SEGREL64LSB"),
    (0x64, "R_IA64_SECREL32MSB"),
    (0x65, "R_IA64_SECREL32LSB"),
    (0x66, "R_IA64_SECREL64MSB"),
    (0x67, "R_IA64_SECREL64LSB"),
    (0x6c, "R_IA64_REL32MSB"),
    (0x6d, "R_IA64_REL32LSB"),
    (0x6e, "R_IA64_REL64MSB"),
    (0x6f, "R_IA64_REL64LSB"),
    (0x74, "R_IA64_LTV32MSB"),
    (0x75, "R_IA64_LTV32LSB"),
    (0x76, "R_IA64_LTV64MSB"),
    (0x77, "R_IA64_LTV64LSB"),
    (0x79, "R_IA64_PCREL21BI"),
    (0x7a, "R_IA64_PCREL22"),
    (0x7b, "R_IA64_PCREL64I"),
    (0x80, "R_IA64_IPLTMSB"),
    (0x81, "R_IA64_IPLTLSB"),
    (0x84, "R_IA64_COPY"),
    (0x85, "R_IA64_SUB"),
    (0x86, "R_IA64_LTOFF22X"),
    (0x87, "R_IA64_LDXMOV"),
    (0x91, "R_IA64_TPREL14"),
    (0x92, "R_IA64_TPREL22"),
    (0x93, "R_IA64_TPREL64I"),
    (0x96, "R_IA64_TPREL64MSB"),
    (0x97, "R_IA64_TPREL64LSB"),
    (0x9a, "R_IA64_LTOFF_TPREL22"),
    (0xa6, "R_IA64_DTPMOD64MSB"),
    (0xa7, "R_IA64_DTPMOD64LSB"),
    (0xaa, "R_IA64_LTOFF_DTPMOD22"),
    (0xb1, "R_IA64_DTPREL14"),
    (0xb2, "R_IA64_DTPREL22"),
    (0xb3, "R_IA64_DTPREL64I"),
    (0xb4, "R_IA64_DTPREL32MSB"),
    (0xb5, "R_IA64_DTPREL32LSB"),
    (0xb6, "R_IA64_DTPREL64MSB"),
    (0xb7, "R_IA64_DTPREL64LSB"),
    (0xba, "R_IA64_LTOFF_DTPREL22"),
];

const PARISC: &[(u32, &str)] = &[
    (0, "R_PARISC_NONE"),
    (1, "R_PARISC_DIR32"),
    (2, "R_PARISC_DIR21L"),
    (3, "R_PARISC_DIR17R"),
    (4, "R_PARISC_DIR17F"),
    (6, "R_PARISC_DIR14R"),
    (8, "R_PARISC_PCREL32"),
    (9, "R_PARISC_PCREL21L"),
    (10, "R_PARISC_PCREL17R"),
    (11, "R_PARISC_PCREL17F"),
    (14, "R_PARISC_PCREL14R"),
    (18, "R_PARISC_DPREL21L"),
    (22, "R_PARISC_DPREL14R"),
    (26, "R_PARISC_GPREL21L"),
    (30, "R_PARISC_GPREL14R"),
    (34, "R_PARISC_LTOFF21L"),
    (38, "R_PARISC_LTOFF14R"),
    (41, "R_PARISC_SECREL32"),
    (48, "R_PARISC_SEGBASE"),
    (49, "R_PARISC_SEGREL32"),
    (50, "R_PARISC_PLTOFF21L"),
    (54, "R_PARISC_PLTOFF14R"),
    (57, "R_PARISC_LTOFF_FPTR32"),
    (58, "R_PARISC_LTOFF_FPTR21L"),
    (62, "R_PARISC_LTOFF_FPTR14R"),
    (64, "R_PARISC_FPTR64"),
    (65, "R_PARISC_PLABEL32"),
    (66, "R_PARISC_PLABEL21L"),
    (70, "R_PARISC_PLABEL14R"),
    (72, "R_PARISC_PCREL64"),
    (74, "R_PARISC_PCREL22F"),
    (75, "R_PARISC_PCREL14WR"),
    (76, "R_PARISC_PCREL14DR"),
    (77, "R_PARISC_PCREL16F"),
    (78, "R_PARISC_PCREL16WF"),
    (79, "R_PARISC_PCREL16DF"),
    (80, "R_PARISC_DIR64"),
    (83, "R_PARISC_DIR14WR"),
    (84, "R_PARISC_DIR14DR"),
    (85, "R_PARISC_DIR16F"),
    (86, "R_PARISC_DIR16WF"),
    (87, "R_PARISC_DIR16DF"),
    (88, "R_PARISC_GPREL64"),
    (91, "R_PARISC_GPREL14WR"),
    (92, "R_PARISC_GPREL14DR"),
    (93, "R_PARISC_GPREL16F"),
    (94, "R_PARISC_GPREL16WF"),
    (95, "R_PARISC_GPREL16DF"),
    (96, "R_PARISC_LTOFF64"),
    (99, "R_PARISC_LTOFF14WR"),
    (100, "R_PARISC_LTOFF14DR"),
    (101, "R_PARISC_LTOFF16F"),
    (102, "R_PARISC_LTOFF16WF"),
    (103, "R_PARISC_LTOFF16DF"),
    (104, "R_PARISC_SECREL64"),
    (112, "R_PARISC_SEGREL64"),
    (115, "R_PARISC_PLTOFF14WR"),
    (116, "R_PARISC_PLTOFF14DR"),
    (117, "R_PARISC_PLTOFF16F"),
    (118, "R_PARISC_PLTOFF16WF"),
    (119, "R_PARISC_PLTOFF16DF"),
    (120, "R_PARISC_LTOFF_FPTR64"),
    (123, "R_PARISC_LTOFF_FPTR14WR"),
    (124, "R_PARISC_LTOFF_FPTR14DR"),
    (125, "R_PARISC_LTOFF_FPTR16F"),
    (126, "R_PARISC_LTOFF_FPTR16WF"),
    (127, "R_PARISC_LTOFF_FPTR16DF"),
    (128, "R_PARISC_COPY"),
    (129, "R_PARISC_IPLT"),
    (130, "R_PARISC_EPLT"),
    (153, "R_PARISC_TPREL32"),
    (154, "R_PARISC_TPREL21L"),
    (158, "R_PARISC_TPREL14R"),
];

const LOONGARCH: &[(u32, &str)] = &[
    (0, "R_LARCH_NONE"),
    (1, "R_LARCH_32"),
    (2, "R_LARCH_64"),
    (3, "R_LARCH_RELATIVE"),
    (4, "R_LARCH_COPY"),
    (5, "R_LARCH_JUMP_SLOT"),
    (6, "R_LARCH_TLS_DTPMOD32"),
    (7, "R_LARCH_TLS_DTPMOD64"),
    (8, "R_LARCH_TLS_DTPREL32"),
    (9, "R_LARCH_TLS_DTPREL64"),
    (10, "R_LARCH_TLS_TPREL32"),
    (11, "R_LARCH_TLS_TPREL64"),
    (12, "R_LARCH_IRELATIVE"),
    (64, "R_LARCH_B16"),
    (65, "R_LARCH_B21"),
    (66, "R_LARCH_B26"),
    (67, "R_LARCH_ABS_HI20"),
    (68, "R_LARCH_ABS_LO12"),
    (69, "R_LARCH_ABS64_LO20"),
    (70, "R_LARCH_ABS64_HI12"),
    (71, "R_LARCH_PCALA_HI20"),
    (72, "R_LARCH_PCALA_LO12"),
    (73, "R_LARCH_PCALA64_LO20"),
    (74, "R_LARCH_PCALA64_HI12"),
    (75, "R_LARCH_GOT_PC_HI20"),
    (76, "R_LARCH_GOT_PC_LO12"),
];

const ALPHA: &[(u32, &str)] = &[
    (0, "R_ALPHA_NONE"),
    (1, "R_ALPHA_REFLONG"),
    (2, "R_ALPHA_REFQUAD"),
    (3, "R_ALPHA_GPREL32"),
    (4, "R_ALPHA_LITERAL"),
    (5, "R_ALPHA_LITUSE"),
    (6, "R_ALPHA_GPDISP"),
    (7, "R_ALPHA_BRADDR"),
    (8, "R_ALPHA_HINT"),
    (9, "R_ALPHA_SREL16"),
    (10, "R_ALPHA_SREL32"),
    (11, "R_ALPHA_SREL64"),
    (17, "R_ALPHA_GPRELHIGH"),
    (18, "R_ALPHA_GPRELLOW"),
    (19, "R_ALPHA_GPREL16"),
    (24, "R_ALPHA_COPY"),
    (25, "R_ALPHA_GLOB_DAT"),
    (26, "R_ALPHA_JMP_SLOT"),
    (27, "R_ALPHA_RELATIVE"),
];
fn table_for(machine: u16) -> Option<&'static [(u32, &'static str)]>
{
    let table = match machine {
        EM_X86_64 => X86_64,
        EM_386 => I386,
        EM_AARCH64 => AARCH64,
        EM_ARM => ARM,
        EM_RISCV => RISCV,
        EM_PPC => PPC,
        EM_PPC64 => PPC64,
        EM_MIPS => MIPS,
        EM_SPARC | EM_SPARC32PLUS | EM_SPARCV9 => SPARC,
        EM_S390 => S390,
        EM_IA_64 => IA64,
        EM_PARISC => PARISC,
        EM_LOONGARCH => LOONGARCH,
        EM_ALPHA => ALPHA,
        _ => return None,
    };
    Some(table)
}

/// Symbolic name of relocation `r_type` on `machine`.
pub fn relocation_type_name(machine: u16, r_type: u32) -> Option<&'static str>
{
    let table = table_for(machine)?;
    table
        .binary_search_by_key(&r_type, |&(number, _)| number)
        .ok()
        .map(|slot| table[slot].1)
}

/// Whether `r_type` is a segment-relative relocation on `machine`.
///
/// The IA-64 and PA-RISC unwind tables are only ever relocated this way.
pub fn is_segment_relative(machine: u16, r_type: u32) -> bool
{
    match machine {
        EM_IA_64 => matches!(r_type, 0x5c..=0x5f),
        EM_PARISC => matches!(r_type, 49 | 112),
        _ => false,
    }
}
